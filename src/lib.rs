#![doc = "The `teamflow` library crate."]
#![doc = ""]
#![doc = "Projects, role-scoped memberships and tasks for student teams: domain models,"]
#![doc = "bearer-token authentication, the storage seam, services and route configuration."]
#![doc = "The binary (`main.rs`) wires these into an `HttpServer`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
