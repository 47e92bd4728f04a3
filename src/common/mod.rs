//! Common types and error definitions for tl_rrt_star
//!
//! This module provides the foundational building blocks used across
//! the planning modules in this crate.

pub mod types;
pub mod error;

pub use types::*;
pub use error::*;
