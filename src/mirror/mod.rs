// src/mirror/mod.rs

//! Building blocks of the mirror that do not depend on sessions or events.
//!
//! - [`path_map`] translates source paths into target paths.
//! - [`filter`] decides which paths take part in mirroring.
//! - [`pipeline`] holds the ordered rewrite rules; [`rules`] the built-in ones.
//! - [`skeleton`] creates and removes directory trees on the target side.

pub mod filter;
pub mod path_map;
pub mod pipeline;
pub mod rules;
pub mod skeleton;

pub use filter::Filter;
pub use path_map::PathMapper;
pub use pipeline::{RuleFn, SharedPipeline, TransformPipeline};
pub use skeleton::{ensure_skeleton, remove_tree};
