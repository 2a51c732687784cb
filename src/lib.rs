//! Turns JSON quiz exports into Anki decks.
//!
//! [`quiz`] loads the question records, [`deck`] turns them into notes using
//! the card layout in [`model`], and [`apkg`] packages the result.

pub mod apkg;
pub mod deck;
pub mod model;
pub mod quiz;
