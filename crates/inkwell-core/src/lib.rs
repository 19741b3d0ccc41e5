//! # Inkwell Core
//!
//! The domain layer of the Inkwell blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the category tree, pagination rules, the authorization policy
//! and the ports that infrastructure implements.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;

pub use error::DomainError;
