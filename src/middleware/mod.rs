// Middleware for the Convertly HTTP surface

pub mod cors;

pub use cors::{dynamic_cors_middleware, CorsPolicy};
