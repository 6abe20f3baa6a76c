//! # Runline Engine
//!
//! Runs an endless-runner session on top of `runline-world`.
//!
//! This crate ties together:
//! - Configuration loaded from TOML
//! - Asset source selection (level files or the built-in demo level)
//! - The session lifecycle: prop and segment warm-up, ticking, teardown
//! - The fixed-rate application loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod app;
pub mod assets;
pub mod config;
pub mod demo;
pub mod session;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::assets::*;
    pub use crate::config::*;
    pub use crate::session::*;
}

pub use prelude::*;
