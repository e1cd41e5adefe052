//! Storysmith: short genre stories assembled from phrase banks.
//!
//! A topic, a genre and a length tier go in; a titled story of a few hundred
//! to about a thousand words comes out. Stories are built from sentence
//! templates and genre phrase pools loaded from RON, composed as
//! opening → scene → filler → climax → resolution, then trimmed to the
//! requested word count.

pub mod config;
pub mod core;
pub mod schema;

pub use crate::core::composer::{ComposerSettings, StoryComposer};
pub use crate::core::phrase_bank::{PhraseBank, PhraseBankError};
pub use crate::core::session::{Presenter, StaticDisplay, StorySession};
pub use crate::schema::request::{GenerationRequest, LengthTier};
pub use crate::schema::story::Story;
