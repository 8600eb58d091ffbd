//! Donation Core Types
//!
//! This crate defines the data structures shared by the one-time payment
//! coordinator, its collaborators and the frontends.

mod config;
mod error;
mod service;
mod types;

pub use config::*;
pub use error::*;
pub use service::*;
pub use types::*;
