/// Story session: the view-model behind a story UI.
///
/// Holds the form inputs, the last request, what is displayed and the edit
/// flag as explicit fields, and drives a [`Presenter`] for output.

use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::composer::StoryComposer;
use crate::core::text::{slugify, word_count};
use crate::schema::request::{GenerationRequest, LengthTier};

/// Inputs of the story shown when a session opens.
pub const SAMPLE_TOPIC: &str = "a pocket watch that runs backwards";
pub const SAMPLE_GENRE: &str = "Mystery";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("the story is locked; toggle edit mode first")]
    NotEditing,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no story to export, generate one first")]
    EmptyStory,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where generated text goes.
pub trait Presenter {
    /// Show `text`, revealing it gradually when `animate` is set.
    fn present(&mut self, text: &str, animate: bool);
    /// Remove whatever is shown.
    fn clear(&mut self);
}

/// Presenter that keeps the latest text and never animates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticDisplay {
    pub text: String,
}

impl Presenter for StaticDisplay {
    fn present(&mut self, text: &str, _animate: bool) {
        self.text = text.to_string();
    }

    fn clear(&mut self) {
        self.text.clear();
    }
}

/// The three inputs a reader fills in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryForm {
    pub topic: String,
    pub genre: String,
    pub length: LengthTier,
}

/// A request cached for "regenerate with the same inputs".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRequest {
    pub request: GenerationRequest,
    pub length: LengthTier,
}

pub struct StorySession<P: Presenter> {
    composer: StoryComposer,
    pub form: StoryForm,
    last: Option<LastRequest>,
    displayed: String,
    meta: String,
    editing: bool,
    presenter: P,
}

impl<P: Presenter> StorySession<P> {
    pub fn new(composer: StoryComposer, presenter: P) -> Self {
        let form = StoryForm {
            topic: String::new(),
            genre: composer.bank().default_genre().to_string(),
            length: LengthTier::default(),
        };
        Self {
            composer,
            form,
            last: None,
            displayed: String::new(),
            meta: String::new(),
            editing: false,
            presenter,
        }
    }

    pub fn composer(&self) -> &StoryComposer {
        &self.composer
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// The full text of the current story (including any edits).
    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    /// One-line summary of the inputs behind the current story.
    pub fn meta(&self) -> &str {
        &self.meta
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn last_request(&self) -> Option<&LastRequest> {
        self.last.as_ref()
    }

    /// Compose a story from the form and present it.
    pub fn generate<R: Rng + ?Sized>(&mut self, animate: bool, rng: &mut R) -> &str {
        let length = self.form.length;
        let target = length.target_word_count(rng);
        let request = GenerationRequest::new(&self.form.topic, &self.form.genre, target);

        self.meta = format!(
            "Topic: {} · Genre: {} · Target ≈ {} words",
            request.topic, request.genre, target
        );
        tracing::info!(topic = %request.topic, genre = %request.genre, %length, target, "generating story");

        let text = self.composer.compose_text(&request, rng);
        self.last = Some(LastRequest { request, length });
        self.show(text, animate)
    }

    /// Compose again from the cached request (same target). Without one,
    /// this is `generate(true)`.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        let Some(last) = self.last.as_ref() else {
            return self.generate(true, rng);
        };
        let text = self.composer.compose_text(&last.request, rng);
        self.show(text, true)
    }

    /// Fill the form with a random topic, genre and length, then generate.
    pub fn surprise<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        let bank = self.composer.bank();
        if let Some(topic) = bank.pools.surprise_topics.choose(rng) {
            self.form.topic = topic.clone();
        }
        if let Some(genre) = bank.genre_names().choose(rng) {
            self.form.genre = genre.to_string();
        }
        if let Some(length) = LengthTier::ALL.choose(rng) {
            self.form.length = *length;
        }
        self.generate(true, rng)
    }

    /// Show the opening sample story: sample topic and genre, current
    /// length, no animation.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        self.form.topic = SAMPLE_TOPIC.to_string();
        self.form.genre = SAMPLE_GENRE.to_string();
        self.generate(false, rng)
    }

    /// Empty the topic, the story and the meta line.
    pub fn clear(&mut self) {
        self.form.topic.clear();
        self.displayed.clear();
        self.meta.clear();
        self.editing = false;
        self.presenter.clear();
    }

    /// Flip edit mode. Locking records the current length in the meta line.
    pub fn toggle_edit(&mut self) -> bool {
        self.editing = !self.editing;
        if !self.editing {
            let words = word_count(&self.displayed);
            self.meta.push_str(&format!(" · Saved length: {} words", words));
        }
        self.editing
    }

    /// Replace the story text while in edit mode.
    pub fn replace_text(&mut self, text: &str) -> Result<(), SessionError> {
        if !self.editing {
            return Err(SessionError::NotEditing);
        }
        self.displayed = text.to_string();
        self.presenter.present(text, false);
        Ok(())
    }

    /// File name the current story exports to: the slugified form topic.
    pub fn export_filename(&self) -> String {
        format!("{}.txt", slugify(&self.form.topic))
    }

    /// Write the current story into `dir`, returning the file path.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let content = self.displayed.trim();
        if content.is_empty() {
            return Err(ExportError::EmptyStory);
        }
        let path = dir.join(self.export_filename());
        std::fs::write(&path, content)?;
        tracing::info!(path = %path.display(), words = word_count(content), "exported story");
        Ok(path)
    }

    fn show(&mut self, text: String, animate: bool) -> &str {
        self.editing = false;
        self.presenter.present(&text, animate);
        self.displayed = text;
        &self.displayed
    }
}
