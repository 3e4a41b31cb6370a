//! Shared types and utilities for the wiredesk client and development server.

pub mod models;
pub mod protocol;
pub mod error;

pub use models::*;
pub use protocol::*;
pub use error::*;
