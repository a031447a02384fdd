//! # Book Model
//!
//! The content source for a single work of fiction: its structural units
//! (book, part, chapter), its characters, factions and relationships.
//! A [`WorkDataset`] is built once per work and never mutated afterwards;
//! editing produces a replacement value.
//!
//! This crate contains no reveal logic. It only guarantees that the data is
//! deduplicated and well-typed when it is handed to `reveal_core`.

pub mod dataset;
pub mod entities;
pub mod error;
pub mod ordered_set;
pub mod structure;

pub use dataset::*;
pub use entities::*;
pub use error::*;
pub use ordered_set::*;
pub use structure::*;
