//! Core domain model for trackmap.
//!
//! This crate defines the track records exported to the web client, the
//! consolidated track universe they are derived from, artist attributes,
//! the embedding vocabulary, and the shared error type.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;

pub use error::{Error, Result};
