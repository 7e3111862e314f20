//! Utility functions for authentication.

/// Normalize an email address for identity lookups.
///
/// Emails are the identity key across platforms, so every read and write
/// goes through this function first.
///
/// # Examples
///
/// ```
/// use playsync_auth::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email address format.
///
/// Basic shape check only: exactly one `@`, non-empty local part, a dotted
/// domain and a sane length. Providers have already verified ownership.
///
/// # Examples
///
/// ```
/// use playsync_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@mail.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@localhost"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Shorten a secret for log output, keeping only a recognizable prefix.
///
/// ```
/// use playsync_auth::utils::redact;
///
/// assert_eq!(redact("abcdefghijkl"), "abcd…");
/// assert_eq!(redact("ab"), "…");
/// ```
#[must_use]
pub fn redact(secret: &str) -> String {
    match secret.get(..4) {
        Some(prefix) if secret.len() > 8 => format!("{prefix}…"),
        _ => "…".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_email(" Bob@X.com");
        assert_eq!(normalize_email(&once), once);
    }

    #[test]
    fn test_rejects_multiple_at_signs() {
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("a b@example.com"));
    }
}
