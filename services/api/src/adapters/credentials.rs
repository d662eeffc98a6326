//! services/api/src/adapters/credentials.rs
//!
//! This module contains the credential-store adapter, the concrete
//! implementation of the `CredentialStore` port from the `core` crate.
//! Passwords are hashed with argon2 at registration and only ever compared
//! through verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use campus_print_core::ports::{CredentialStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An in-process credential store. Accounts are registered at startup (see
/// `SEED_ACCOUNTS`); only the argon2 PHC strings are kept in memory.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    /// lowercased email -> argon2 PHC string
    accounts: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes and stores a password for an account.
    pub fn register(&self, email: &str, password: &str) -> PortResult<()> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PortError::Unexpected(format!("failed to hash password: {e}")))?
            .to_string();
        self.accounts
            .write()
            .insert(email.to_ascii_lowercase(), hash);
        Ok(())
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn verify_credentials(&self, email: &str, password: &str) -> PortResult<bool> {
        let Some(hash) = self.accounts.read().get(&email.to_ascii_lowercase()).cloned() else {
            // Unknown addresses answer exactly like a wrong password.
            return Ok(false);
        };
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| PortError::Unexpected(format!("stored hash is invalid: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
