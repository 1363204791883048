//! Turns a project file into a configured [`Project`].
//!
//! [`Project`]: cljb_graph::Project

pub mod cfgs;
pub mod defs;
pub mod engine;

pub use engine::Engine;
