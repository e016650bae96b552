use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
const RESET_TOKEN_LEN: usize = 48;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalized email, or a 400 when it does not look like an address.
pub(crate) fn checked_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Email inválido"));
    }
    Ok(email)
}

pub(crate) fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
        )));
    }
    Ok(())
}

/// Trimmed non-empty value of a required text field.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, AppError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::validation(format!("El campo {field} es obligatorio")));
    }
    Ok(v.to_string())
}

pub(crate) fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ana@solvia.org"));
        assert!(!is_valid_email("ana@solvia"));
        assert!(!is_valid_email("ana solvia@x.org"));
        assert_eq!(checked_email("  Ana@Solvia.ORG ").unwrap(), "ana@solvia.org");
        assert!(checked_email("nope").is_err());
    }

    #[test]
    fn password_length_counts_chars() {
        assert!(check_password("corta").is_err());
        assert!(check_password("contraseña").is_ok());
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("  Huerta ", "name").unwrap(), "Huerta");
        assert!(required_text("   ", "name").is_err());
    }

    #[test]
    fn reset_tokens_are_random_alphanumeric() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
