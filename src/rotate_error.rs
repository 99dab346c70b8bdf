use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::utils::sanitize_sensitive_info;

#[macro_export]
macro_rules! create_rotate_error {
    ($($arg:tt)*) => {
        $crate::rotate_error::RotateError::new(format!($($arg)*))
    };
}
pub use create_rotate_error;

#[macro_export]
macro_rules! create_rotate_error_result {
    ($($arg:tt)*) => {
        Err($crate::rotate_error::RotateError::new(format!($($arg)*)))
    };
}
pub use create_rotate_error_result;

#[derive(Debug)]
pub struct RotateError {
    pub message: String,
}

impl RotateError {
    pub const fn new(message: String) -> Self {
        Self { message }
    }
}

impl Display for RotateError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", sanitize_sensitive_info(&self.message))
    }
}

impl Error for RotateError {}

impl From<std::io::Error> for RotateError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<reqwest::Error> for RotateError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors can embed the full request url
        Self::new(sanitize_sensitive_info(&err.to_string()))
    }
}

impl From<serde_json::Error> for RotateError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_yaml::Error> for RotateError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<openssl::error::ErrorStack> for RotateError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        Self::new(err.to_string())
    }
}
