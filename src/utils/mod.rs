// Utility modules for the Convertly backend

pub mod password;
pub mod service_error;

pub use password::{hash_password, verify_password, PasswordError};
pub use service_error::ServiceError;
