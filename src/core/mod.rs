//! Core domain models
//!
//! This module defines the data structures that represent pipeline
//! specifications, steps, and run state.

pub mod spec;
pub mod state;

pub use spec::*;
pub use state::*;
