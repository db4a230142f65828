use thiserror::Error;

/// Why a registration did not produce an account. The `Display` text is the
/// reason shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid username")]
    InvalidUsername,

    #[error("Password too short")]
    PasswordTooShort,

    #[error("User already exists")]
    AlreadyExists,

    /// Storage or hashing fault; details only go to the log.
    #[error("Registration failed")]
    Failed,
}

impl RegistrationError {
    /// Rejections caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RegistrationError::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);
