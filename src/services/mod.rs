//! Request-independent operations. Every function takes the store explicitly
//! and returns `AppError`, so handlers stay thin and the rules are testable
//! without HTTP.

pub mod access;
pub mod accounts;
pub mod meetings;
pub mod projects;
pub mod tasks;
