//! Core types and trait definitions for the Gather event cache.
//!
//! This crate is deliberately free of database and filesystem dependencies.
//! The storage backend (`gather-store-sqlite`) and the sync orchestrator
//! (`gather-sync`) both depend on it.

pub mod error;
pub mod event;
pub mod note;
pub mod source;
pub mod store;

pub use error::{Error, Result};
