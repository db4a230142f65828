//! Shape checks for registration input. Deliberately permissive: a passing
//! email is only syntactically plausible, not deliverable.

use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@]+@[^@]+\.[^@]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,50}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("alice@x."));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn username_shapes() {
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("a_b-9"));
        assert!(is_valid_username("valid_User1"));
        assert!(is_valid_username("abc"));
        assert!(is_valid_username(&"a".repeat(50)));
        assert!(!is_valid_username(&"a".repeat(51)));
        assert!(!is_valid_username("with space"));
        assert!(!is_valid_username("ünïcode"));
    }

    #[test]
    fn trailing_newline_is_rejected() {
        assert!(!is_valid_email("alice@x.com\n"));
        assert!(!is_valid_username("abc\n"));
        assert!(!is_valid_username("abc\r\n"));
    }

    #[test]
    fn password_length_only() {
        assert!(!is_valid_password(""));
        assert!(!is_valid_password("12345"));
        assert!(is_valid_password("123456"));
        assert!(is_valid_password("secret1"));
        // counted in characters, not bytes
        assert!(!is_valid_password("ééééé"));
    }
}
