//! Common types, traits, and error definitions for potential_astar
//!
//! This module provides the foundational building blocks shared by the
//! grid map, the potential field and the planner.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
