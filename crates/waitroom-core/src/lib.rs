//! Core types and trait definitions for the Waitroom conversation pipeline.
//!
//! This crate is deliberately free of HTTP, database and runtime
//! dependencies. It holds the pure parts of the pipeline (cap policy, context
//! windowing, summary merging) and the traits the outer crates implement.

pub mod cap;
pub mod error;
pub mod message;
pub mod prompts;
pub mod reasoner;
pub mod session;
pub mod store;
pub mod summary;
pub mod window;

pub use error::{Error, Result};
