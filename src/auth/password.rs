use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Characters accepted as the "symbol" class by the password policy.
pub const ALLOWED_SYMBOLS: &str = "@$!%*?&";

// Memory-hard enough to land in the quarter-second range on commodity
// hardware. Hashing always runs on the blocking pool, never on the
// async runtime.
fn argon2() -> anyhow::Result<Argon2<'static>> {
    let params =
        Params::new(64 * 1024, 3, 1, None).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(argon2()?
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Password policy: at least 8 characters, one lowercase, one uppercase,
/// one digit and one symbol from the allowed set, nothing outside those
/// classes. Applied to self-registration and seeded admins alike.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".into());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter".into());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter".into());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".into());
    }
    if !password.chars().any(|c| ALLOWED_SYMBOLS.contains(c)) {
        return Err(format!(
            "Password must contain at least one special character ({ALLOWED_SYMBOLS})"
        ));
    }
    if password
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !ALLOWED_SYMBOLS.contains(c))
    {
        return Err(format!(
            "Password may only contain letters, digits and {ALLOWED_SYMBOLS}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod hash_tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    #[test]
    fn accepts_compliant_passwords() {
        for pw in ["Secret123!", "Admin123!", "aB3$aB3$", "LongerPassw0rd?"] {
            assert!(validate_password(pw).is_ok(), "{pw} should be valid");
        }
    }

    #[test]
    fn rejects_when_one_class_is_missing() {
        let cases = [
            ("alllowercase1!", "uppercase"),
            ("ALLUPPERCASE1!", "lowercase"),
            ("NoDigitsHere!", "digit"),
            ("NoSymbols123", "special"),
        ];
        for (pw, expected) in cases {
            let reason = validate_password(pw).unwrap_err();
            assert!(
                reason.to_lowercase().contains(expected),
                "{pw}: got reason {reason:?}"
            );
        }
    }

    #[test]
    fn rejects_short_passwords() {
        let reason = validate_password("aB1!").unwrap_err();
        assert!(reason.contains("8 characters"));
    }

    #[test]
    fn rejects_characters_outside_the_allowed_classes() {
        let reason = validate_password("Secret123#").unwrap_err();
        assert!(reason.contains("may only contain"));
    }
}
