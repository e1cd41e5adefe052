//! WASM bindings for storysmith: powers the in-browser story form.
//!
//! The page owns the typewriter animation; this side only composes text and
//! keeps the session state.

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

use storysmith::core::composer::StoryComposer;
use storysmith::core::phrase_bank::PhraseBank;
use storysmith::core::session::{StaticDisplay, StorySession};
use storysmith::schema::request::LengthTier;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct FormInfo<'a> {
    topic: &'a str,
    genre: &'a str,
    length: &'a str,
    text: &'a str,
    meta: &'a str,
}

// ---------------------------------------------------------------------------
// StorySmith: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StorySmith {
    session: StorySession<StaticDisplay>,
    rng: StdRng,
}

#[wasm_bindgen]
impl StorySmith {
    /// Create a session over the built-in phrase bank with a fixed seed.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<StorySmith, JsError> {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Create a session seeded from the browser's entropy source.
    pub fn random() -> Result<StorySmith, JsError> {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Compose a story from the form inputs. `length` is "short", "medium"
    /// or "long"; anything else is medium.
    pub fn generate(&mut self, topic: &str, genre: &str, length: &str) -> String {
        self.session.form.topic = topic.to_string();
        self.session.form.genre = genre.to_string();
        self.session.form.length = LengthTier::parse(length);
        self.session.generate(true, &mut self.rng).to_string()
    }

    /// Compose again with the previous inputs and target.
    pub fn regenerate(&mut self) -> String {
        self.session.regenerate(&mut self.rng).to_string()
    }

    /// Pick random inputs and compose. Returns JSON with the chosen
    /// `topic`, `genre` and `length` (to refill the form) plus `text` and `meta`.
    pub fn surprise(&mut self) -> Result<String, JsError> {
        self.session.surprise(&mut self.rng);
        self.form_json()
    }

    /// The opening sample story (a Mystery about a pocket watch that runs
    /// backwards), shown without animation when the page loads. Returns the
    /// same JSON as `surprise` so the form can be filled in.
    pub fn sample(&mut self) -> Result<String, JsError> {
        self.session.sample(&mut self.rng);
        self.form_json()
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Flip edit mode; returns whether the story is now editable.
    #[wasm_bindgen(js_name = toggleEdit)]
    pub fn toggle_edit(&mut self) -> bool {
        self.session.toggle_edit()
    }

    /// Store the reader's edited text. Only allowed in edit mode.
    #[wasm_bindgen(js_name = replaceText)]
    pub fn replace_text(&mut self, text: &str) -> Result<(), JsError> {
        self.session
            .replace_text(text)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn text(&self) -> String {
        self.session.displayed().to_string()
    }

    pub fn meta(&self) -> String {
        self.session.meta().to_string()
    }

    /// Download name for the current story, e.g. `a_broken_compass.txt`.
    #[wasm_bindgen(js_name = exportFilename)]
    pub fn export_filename(&self) -> String {
        self.session.export_filename()
    }

    /// JSON array of genre names.
    pub fn genres(&self) -> String {
        serde_json::to_string(&self.session.composer().bank().genre_names())
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of length tier names.
    pub fn lengths() -> String {
        let names: Vec<&str> = LengthTier::ALL.iter().map(|t| t.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }
}

// Private helpers
impl StorySmith {
    fn with_rng(rng: StdRng) -> Result<StorySmith, JsError> {
        let bank = PhraseBank::builtin()
            .map_err(|e| JsError::new(&format!("Phrase bank error: {e}")))?;
        Ok(StorySmith {
            session: StorySession::new(StoryComposer::new(bank), StaticDisplay::default()),
            rng,
        })
    }

    fn form_json(&self) -> Result<String, JsError> {
        let form = &self.session.form;
        let info = FormInfo {
            topic: &form.topic,
            genre: &form.genre,
            length: form.length.name(),
            text: self.session.displayed(),
            meta: self.session.meta(),
        };
        serde_json::to_string(&info)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smith(seed: u64) -> StorySmith {
        StorySmith::new(seed).unwrap_or_else(|_| panic!("built-in phrase bank failed to load"))
    }

    #[test]
    fn generate_and_edit_round_trip() {
        let mut smith = smith(7);
        let text = smith.generate("a broken compass", "mystery", "short");
        assert!(text.starts_with("Mystery — A broken compass"));
        assert_eq!(smith.text(), text);
        assert_eq!(smith.export_filename(), "a_broken_compass.txt");

        assert!(smith.toggle_edit());
        assert!(smith.replace_text("Edited.").is_ok());
        assert!(!smith.toggle_edit());
        assert!(smith.meta().ends_with("Saved length: 1 words"));
    }

    #[test]
    fn sample_fills_form_with_pocket_watch_mystery() {
        let mut smith = smith(3);
        let json = smith.sample().unwrap_or_else(|_| panic!("sample failed"));
        let info: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(info["topic"], "a pocket watch that runs backwards");
        assert_eq!(info["genre"], "Mystery");
        assert_eq!(info["length"], "medium");
        assert!(smith.text().starts_with("Mystery — A pocket watch that runs backwards"));
        assert_eq!(info["text"], smith.text());
    }

    #[test]
    fn genres_lists_builtin_bank() {
        let smith = smith(1);
        let genres: Vec<String> = serde_json::from_str(&smith.genres()).unwrap();
        assert_eq!(genres.len(), 8);
        assert!(genres.contains(&"Comedy".to_string()));
    }
}
