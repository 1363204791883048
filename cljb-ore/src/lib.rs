//! Small utilities shared across the `cljb` crates.
//!
//! Nothing in here should know about source sets, tasks, or plugins.

pub mod assert;
pub mod env;
pub mod id_gen;
