//! Password hashing for registration.

use argon2::{
  Argon2, PasswordHasher,
  password_hash::SaltString,
};
use rand_core::OsRng;
use vidtube_core::{Error, Result};

/// Hash `password` into an argon2 PHC string on the blocking pool.
pub async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
  })
  .await
  .map_err(|e| Error::Internal(format!("hashing task failed: {e}")))?
  .map_err(|e| Error::Internal(format!("argon2 error: {e}")))
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHash, PasswordVerifier};

  use super::*;

  #[tokio::test]
  async fn hash_verifies_against_input() {
    let hash = hash_password("hunter2".into()).await.unwrap();
    assert!(hash.starts_with("$argon2"));

    let parsed = PasswordHash::new(&hash).unwrap();
    assert!(Argon2::default().verify_password(b"hunter2", &parsed).is_ok());
    assert!(Argon2::default().verify_password(b"hunter3", &parsed).is_err());
  }
}
