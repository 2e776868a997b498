//! `toolbox-core` — shared building blocks for the toolbox crates.
//!
//! This crate holds the type-erased [`Value`] carried inside event payloads.

pub mod error;
pub mod value;

pub use error::{ValueError, ValueResult};
pub use value::Value;
