//! # Reveal Core
//!
//! Spoiler-free character graphs for works of fiction. Given a reader's
//! position in a book, this crate decides which characters, factions and
//! relationships the reader has already met, and describes them as a graph
//! a force-directed renderer can draw.
//!
//! ## Core Components
//!
//! - **hierarchy**: Builds the book → part → chapter forest and its reading order
//! - **visibility**: Filters a work down to what is known at a position
//! - **graph_model**: Turns a visible set into positioned nodes and edges
//! - **viewer**: Shell-owned state, work switching, navigation rows and details
//! - **config**: TOML settings for the graph and visibility stages
//!
//! ## Design Philosophy
//!
//! - **Snapshot-Driven**: Every recomputation reads one immutable dataset
//! - **Pure Stages**: The core keeps no state between calls; the shell owns it
//! - **Monotonic**: Reading further only ever reveals more

pub mod config;
pub mod error;
pub mod graph_model;
pub mod hierarchy;
pub mod viewer;
pub mod visibility;

pub use config::*;
pub use error::*;
pub use graph_model::*;
pub use hierarchy::*;
pub use viewer::*;
pub use visibility::*;
