//! Password hashing and token issuance capabilities.
//!
//! The services only see these traits. [`Argon2Hasher`] is the production
//! hasher; token signing lives in `furlough-api`.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use rand_core::OsRng;

use crate::{
  Error, Result,
  account::Identity,
};

/// One-way password hashing.
pub trait CredentialHasher: Send + Sync {
  /// Produce a storable hash of `password`.
  fn hash(&self, password: &str) -> Result<String>;

  /// `Ok(false)` on a mismatch; `Err` only if `hash` is unusable.
  fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Signs access tokens for authenticated accounts.
pub trait TokenIssuer: Send + Sync {
  fn issue(&self, identity: &Identity) -> Result<String>;
}

/// Argon2id with the crate's default parameters, producing PHC strings.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
  argon2: Argon2<'static>,
}

impl CredentialHasher for Argon2Hasher {
  fn hash(&self, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    self
      .argon2
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::Credential(e.to_string()))
  }

  fn verify(&self, password: &str, hash: &str) -> Result<bool> {
    let parsed =
      PasswordHash::new(hash).map_err(|e| Error::Credential(e.to_string()))?;
    match self.argon2.verify_password(password.as_bytes(), &parsed) {
      Ok(()) => Ok(true),
      Err(password_hash::Error::Password) => Ok(false),
      Err(e) => Err(Error::Credential(e.to_string())),
    }
  }
}
