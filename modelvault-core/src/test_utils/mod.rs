//! Test fixtures shared by the unit tests
//!
//! A small todo-list model (items sharing tags), a preferences model with
//! field-wise merging, and a linked node type that can form cycles.

pub mod deterministic_rng;
pub mod fixtures;
pub mod strategies;

pub use deterministic_rng::*;
pub use fixtures::*;
pub use strategies::*;
