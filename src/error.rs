/// Message shown when a password and its confirmation differ.
pub const PASSWORD_MISMATCH: &str = "Las contraseñas no coinciden";

/// Fallback message for authentication failures without a server message.
pub const GENERIC_AUTH_FAILURE: &str = "Ha ocurrido un error durante la autenticación";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Client-side check failed before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The API answered with a non-success status.
    #[error("API error {status} on {operation}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No refresh token available")]
    NoRefreshToken,

    /// A response arrived after the session it belonged to had been cleared.
    #[error("Session was cleared while the request was in flight")]
    Superseded,

    #[error("Token error: {0}")]
    Token(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of an API rejection, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            #[cfg(feature = "http")]
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// `true` for a 401 answer from the API.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for display: the server message verbatim when the API
    /// provided one, the validation message for local checks.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::NoRefreshToken => self.to_string(),
            _ => GENERIC_AUTH_FAILURE.to_string(),
        }
    }

    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    pub(crate) fn password_mismatch() -> Self {
        Self::Validation(PASSWORD_MISMATCH.into())
    }
}
