use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::AppError;
use bcrypt::{hash, verify};
use lazy_static::lazy_static;

lazy_static! {
    // Hashes of no real password, one per cost, for logins naming no account
    static ref DUMMY_HASHES: Mutex<HashMap<u32, String>> = Mutex::new(HashMap::new());
}

/// Hashes with bcrypt at `cost`; a fresh salt is generated each call.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(hash(password, cost)?)
}

/// A bcrypt hash at `cost` that matches no password a user registered.
/// Computed on first use for each cost.
pub fn dummy_hash(cost: u32) -> Result<String, AppError> {
    let mut hashes = DUMMY_HASHES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(hashed) = hashes.get(&cost) {
        return Ok(hashed.clone());
    }
    let hashed = hash_password("no account has this password", cost)?;
    hashes.insert(cost, hashed.clone());
    Ok(hashed)
}

/// A malformed stored hash counts as a mismatch rather than an error.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            log::warn!("stored password hash could not be checked: {}", e);
            false
        }
    }
}
