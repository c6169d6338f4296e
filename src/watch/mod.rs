// src/watch/mod.rs

//! File watching and session management.
//!
//! This module is responsible for:
//! - The [`EventSource`] abstraction that produces [`WatchEvent`]s for a root.
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind it.
//! - The [`WatchRegistry`] that owns every watch session and exposes the
//!   public start/stop/render operations.
//!
//! It does **not** decide what happens to a path; that is the engine's job.
//!
//! [`WatchEvent`]: crate::engine::WatchEvent

pub mod notify_source;
pub mod registry;
pub mod source;

pub use notify_source::NotifySource;
pub use registry::{RegistryBuilder, SessionClosing, WatchRegistry};
pub use source::{EventSource, Subscription};
