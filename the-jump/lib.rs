//! Incremental type-to-jump tagging.
//!
//! A host search produces match sites for the query typed so far; this crate
//! decides which of those sites get a short label ("tag"), keeps labels stable
//! while the query grows, and reports a single offset once the keystrokes
//! select a tag. Rendering, cursor movement and scrolling stay with the host,
//! reached through the traits in [`session`].

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod allocate;
pub mod chars;
pub mod compact;
pub mod config;
pub mod cull;
pub mod pool;
pub mod search;
pub mod session;
pub mod tag;
pub mod view;

/// A one or two character label. Never heap allocates at this size.
pub type Tag = SmartString<LazyCompact>;
