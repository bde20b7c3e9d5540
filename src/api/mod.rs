//! Public API layer: the [`Templar`] engine and its builder.

mod templar;

pub use templar::{Templar, TemplarBuilder};
