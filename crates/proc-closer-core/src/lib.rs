//! Proc Closer Core - Platform-independent process discovery and termination
//!
//! This crate provides the data model, traits and generic algorithms that
//! the platform crates plug their enumeration and termination primitives into.

mod closer;
mod collect;
mod config;
mod error;
mod handle;
mod names;
mod owner;
mod process;
mod snapshot;
mod window;

pub use closer::*;
pub use collect::*;
pub use config::*;
pub use error::*;
pub use handle::*;
pub use names::*;
pub use owner::*;
pub use process::*;
pub use snapshot::*;
pub use window::*;
