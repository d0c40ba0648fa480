use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Fallback toast text when the server gives no usable message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stored value for '{key}' is not valid JSON: {source}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("http {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        status: u16,
        message: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Text shown to the user in a toast: the server's own message when it
    /// sent one, otherwise a generic failure string.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Only a superadmin can do that")]
    Forbidden,

    #[error("Too many login attempts. Please try again in a few minutes.")]
    RateLimited,

    #[error("Admin '{0}' already exists")]
    AlreadyExists(String),

    #[error("Admin '{0}' not found")]
    NotFound(String),

    #[error("The seeded superadmin cannot be removed")]
    ProtectedAccount,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Password hashing failed")]
    Hashing,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Store(_) | Self::Hashing => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Failure of a form submission (wizard, booking, profile).
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("could not encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(errors) => errors.to_string(),
            Self::Api(err) => err.user_message(),
            Self::Encode(_) | Self::Store(_) => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<FieldErrors> for SubmitError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Validation failures keyed by field path, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    order: Vec<String>,
    messages: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(path, message);
        errors
    }

    /// Keeps the first message recorded for a path.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let path = path.into();
        if !self.messages.contains_key(&path) {
            self.order.push(path.clone());
            self.messages.insert(path, message.into());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.messages.get(path).map(String::as_str)
    }

    /// The field that should receive focus.
    pub fn first_path(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(|path| (path.as_str(), self.messages[path].as_str()))
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.iter().next() {
            Some((_, message)) if self.len() == 1 => write!(f, "{message}"),
            Some((_, message)) => {
                write!(f, "{message} (and {} more)", self.len() - 1)
            }
            None => write!(f, "no errors"),
        }
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_prefers_server_message() {
        let err = ApiError::Http {
            status: 422,
            message: Some("Slug already taken".into()),
        };
        assert_eq!(err.user_message(), "Slug already taken");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn blank_or_missing_message_falls_back_to_generic() {
        let blank = ApiError::Http {
            status: 500,
            message: Some("  ".into()),
        };
        assert_eq!(blank.user_message(), GENERIC_FAILURE);
        assert_eq!(ApiError::Timeout.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn field_errors_keep_first_message_and_order() {
        let mut errors = FieldErrors::new();
        errors.insert("title", "Title is required");
        errors.insert("slug", "Slug is required");
        errors.insert("title", "Title is too short");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first_path(), Some("title"));
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.to_string(), "Title is required (and 1 more)");
    }
}
