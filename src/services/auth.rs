use crate::config::AuthConfig;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use std::collections::BTreeMap;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_EMAIL_LENGTH: usize = 254;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Field name -> messages, the shape the login endpoint reports back.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

fn validate_email(email: &str) -> Option<&'static str> {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Some("Invalid email address");
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace) =>
        {
            None
        }
        _ => Some("Invalid email address"),
    }
}

/// Shape checks run before any credential comparison.
pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(msg) = validate_email(email) {
        errors.entry("email").or_default().push(msg.to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.entry("password").or_default().push(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        anyhow::bail!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        );
    }
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$0000000000000000000000000000000000000000000";

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => {
            if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
                // Timing padding only; the result is irrelevant.
                let _ = Argon2::default().verify_password(password.as_bytes(), &dummy);
            }
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Checks the submitted credentials against the configured operator and
/// returns the operator's subject id on a match.
pub fn authenticate(auth: &AuthConfig, email: &str, password: &str) -> Option<String> {
    // Always pay for the hash so a wrong email is not faster than a wrong password.
    let password_ok = verify_password(password, &auth.password_hash);
    let email_ok = email.trim().eq_ignore_ascii_case(auth.email.trim());
    if password_ok && email_ok {
        Some(auth.operator_id.clone())
    } else {
        None
    }
}
