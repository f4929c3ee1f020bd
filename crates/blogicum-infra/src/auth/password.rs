//! Account password storage.
//!
//! New passwords are stored as Argon2id PHC strings. A stored value that is
//! not a PHC string (an account created without a usable password, or a
//! hash from a scheme this service cannot read) never matches, so such
//! accounts simply cannot log in with a password.

use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
};
use argon2::{Algorithm, Argon2, Params, Version};

use blogicum_core::ports::{AuthError, PasswordService};

/// Argon2id password service for account credentials.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    /// Build with explicit cost parameters; tests use cheap ones.
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.is_empty() {
            return Err(AuthError::HashingError("password must not be empty".into()));
        }
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let Ok(parsed) = PasswordHash::new(stored) else {
            tracing::warn!("Stored password is not a usable hash");
            return Ok(false);
        };

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => {
                tracing::warn!(algorithm = %parsed.algorithm, error = %e, "Cannot check stored password");
                Ok(false)
            }
        }
    }
}
