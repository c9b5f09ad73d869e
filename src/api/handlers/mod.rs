//! API request handlers.

pub mod children;
pub mod objects;
pub mod relationships;
pub mod status;
