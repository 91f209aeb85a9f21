//! Reparto Core - Shared types library.
//!
//! This crate provides common types used across all Reparto components:
//! - `server` - Delivery tracking API
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, coordinates, emails, roles, and the order
//!   status state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
