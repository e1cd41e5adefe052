/// Phrase bank: genre profiles and shared sentence pools, loaded from RON.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::core::template::{Template, TemplateError};
use crate::schema::genre::GenreProfile;

/// The phrase bank compiled into the crate.
pub const BUILTIN_RON: &str = include_str!("../../genre_data/phrase_bank.ron");

#[derive(Debug, Error)]
pub enum PhraseBankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("template error in '{pool}': {source}")]
    Template {
        pool: String,
        #[source]
        source: TemplateError,
    },
    #[error("pool '{0}' is empty")]
    EmptyPool(String),
    #[error("default genre '{0}' is not defined")]
    MissingDefaultGenre(String),
    #[error("genre name must not be blank")]
    BlankGenreName,
}

/// Fixed sentences every story is built around.
#[derive(Debug, Clone)]
pub struct Scaffold {
    /// "It began with {article} {topic}."
    pub began: Template,
    /// "No one expected {topic} to change anything..."
    pub unexpected: Template,
    /// "{setting} set the scene."
    pub scene: Template,
    /// "The trouble began when {conflict}."
    pub trouble: Template,
    /// Closing line of every twist paragraph.
    pub twist_coda: Template,
}

/// Genre-independent pools shared by every story.
#[derive(Debug, Clone)]
pub struct StoryPools {
    pub roles: Vec<String>,
    pub verbs: Vec<String>,
    pub characters: Vec<Template>,
    pub action_leads: Vec<Template>,
    pub escalations: Vec<Template>,
    pub reflection_intros: Vec<Template>,
    pub reflection_closers: Vec<Template>,
    pub twists: Vec<Template>,
    pub climaxes: Vec<Template>,
    pub resolutions: Vec<Template>,
    pub surprise_topics: Vec<String>,
}

impl StoryPools {
    /// Sentence-template pools by name.
    pub fn template_pools(&self) -> [(&'static str, &[Template]); 8] {
        [
            ("characters", self.characters.as_slice()),
            ("action_leads", self.action_leads.as_slice()),
            ("escalations", self.escalations.as_slice()),
            ("reflection_intros", self.reflection_intros.as_slice()),
            ("reflection_closers", self.reflection_closers.as_slice()),
            ("twists", self.twists.as_slice()),
            ("climaxes", self.climaxes.as_slice()),
            ("resolutions", self.resolutions.as_slice()),
        ]
    }

    /// Plain phrase pools by name.
    pub fn phrase_pools(&self) -> [(&'static str, &[String]); 3] {
        [
            ("roles", self.roles.as_slice()),
            ("verbs", self.verbs.as_slice()),
            ("surprise_topics", self.surprise_topics.as_slice()),
        ]
    }
}

/// Every genre profile plus the shared pools and scaffold.
///
/// Genre lookup ignores case and surrounding whitespace; unknown genres
/// resolve to the default genre, so lookups never fail.
#[derive(Debug, Clone)]
pub struct PhraseBank {
    default_genre: String,
    /// Sorted by canonical name.
    genres: Vec<(String, GenreProfile)>,
    /// Lower-cased name → index into `genres`.
    index: FxHashMap<String, usize>,
    pub scaffold: Scaffold,
    pub pools: StoryPools,
}

// RON deserialization helpers: sentences are authored as strings and
// parsed into templates after loading.

#[derive(Debug, Deserialize)]
#[serde(rename = "PhraseBank")]
struct RonPhraseBank {
    default_genre: String,
    genres: FxHashMap<String, GenreProfile>,
    scaffold: RonScaffold,
    pools: RonPools,
}

#[derive(Debug, Deserialize)]
struct RonScaffold {
    began: String,
    unexpected: String,
    scene: String,
    trouble: String,
    twist_coda: String,
}

#[derive(Debug, Deserialize)]
struct RonPools {
    roles: Vec<String>,
    verbs: Vec<String>,
    characters: Vec<String>,
    action_leads: Vec<String>,
    escalations: Vec<String>,
    reflection_intros: Vec<String>,
    reflection_closers: Vec<String>,
    twists: Vec<String>,
    climaxes: Vec<String>,
    resolutions: Vec<String>,
    surprise_topics: Vec<String>,
}

fn parse_one(pool: &str, text: &str) -> Result<Template, PhraseBankError> {
    Template::parse(text).map_err(|source| PhraseBankError::Template {
        pool: pool.to_string(),
        source,
    })
}

fn parse_pool(pool: &str, texts: Vec<String>) -> Result<Vec<Template>, PhraseBankError> {
    if texts.is_empty() {
        return Err(PhraseBankError::EmptyPool(format!("pools.{}", pool)));
    }
    texts.iter().map(|t| parse_one(pool, t)).collect()
}

fn require_phrases(pool: &str, phrases: Vec<String>) -> Result<Vec<String>, PhraseBankError> {
    if phrases.is_empty() {
        return Err(PhraseBankError::EmptyPool(format!("pools.{}", pool)));
    }
    Ok(phrases)
}

fn validate_profile(name: &str, profile: &GenreProfile) -> Result<(), PhraseBankError> {
    if name.trim().is_empty() {
        return Err(PhraseBankError::BlankGenreName);
    }
    for (pool, entries) in profile.pools() {
        if entries.is_empty() {
            return Err(PhraseBankError::EmptyPool(format!("{}.{}", name, pool)));
        }
    }
    Ok(())
}

impl PhraseBank {
    /// The phrase bank shipped with the crate.
    pub fn builtin() -> Result<PhraseBank, PhraseBankError> {
        Self::parse_ron(BUILTIN_RON)
    }

    /// Load a phrase bank from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<PhraseBank, PhraseBankError> {
        let contents = std::fs::read_to_string(path)?;
        let bank = Self::parse_ron(&contents)?;
        tracing::info!(path = %path.display(), genres = bank.genres.len(), "loaded phrase bank");
        Ok(bank)
    }

    /// Parse and validate a phrase bank from a RON string.
    pub fn parse_ron(input: &str) -> Result<PhraseBank, PhraseBankError> {
        let raw: RonPhraseBank = ron::from_str(input)?;

        let scaffold = Scaffold {
            began: parse_one("scaffold.began", &raw.scaffold.began)?,
            unexpected: parse_one("scaffold.unexpected", &raw.scaffold.unexpected)?,
            scene: parse_one("scaffold.scene", &raw.scaffold.scene)?,
            trouble: parse_one("scaffold.trouble", &raw.scaffold.trouble)?,
            twist_coda: parse_one("scaffold.twist_coda", &raw.scaffold.twist_coda)?,
        };

        let p = raw.pools;
        let pools = StoryPools {
            roles: require_phrases("roles", p.roles)?,
            verbs: require_phrases("verbs", p.verbs)?,
            characters: parse_pool("characters", p.characters)?,
            action_leads: parse_pool("action_leads", p.action_leads)?,
            escalations: parse_pool("escalations", p.escalations)?,
            reflection_intros: parse_pool("reflection_intros", p.reflection_intros)?,
            reflection_closers: parse_pool("reflection_closers", p.reflection_closers)?,
            twists: parse_pool("twists", p.twists)?,
            climaxes: parse_pool("climaxes", p.climaxes)?,
            resolutions: parse_pool("resolutions", p.resolutions)?,
            surprise_topics: require_phrases("surprise_topics", p.surprise_topics)?,
        };

        let mut bank = PhraseBank {
            default_genre: raw.default_genre.trim().to_string(),
            genres: Vec::new(),
            index: FxHashMap::default(),
            scaffold,
            pools,
        };
        for (name, profile) in raw.genres {
            bank.add_genre(&name, profile)?;
        }

        // Canonical casing for the default, e.g. "adventure" → "Adventure".
        let canonical = match bank.lookup(&bank.default_genre) {
            Some((name, _)) => name.to_string(),
            None => return Err(PhraseBankError::MissingDefaultGenre(bank.default_genre)),
        };
        bank.default_genre = canonical;

        Ok(bank)
    }

    /// Parse a RON map of extra genre profiles: `{ "Western": (...), }`.
    pub fn parse_genres_ron(input: &str) -> Result<Vec<(String, GenreProfile)>, PhraseBankError> {
        let raw: FxHashMap<String, GenreProfile> = ron::from_str(input)?;
        let mut genres: Vec<(String, GenreProfile)> = raw.into_iter().collect();
        for (name, profile) in &genres {
            validate_profile(name, profile)?;
        }
        genres.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(genres)
    }

    /// Load extra genre profiles from a RON file and add them to this bank.
    pub fn merge_genres_from_ron(&mut self, path: &Path) -> Result<usize, PhraseBankError> {
        let contents = std::fs::read_to_string(path)?;
        let genres = Self::parse_genres_ron(&contents)?;
        let count = genres.len();
        for (name, profile) in genres {
            self.add_genre(&name, profile)?;
        }
        tracing::info!(path = %path.display(), count, "merged extra genres");
        Ok(count)
    }

    /// Add a genre, replacing any existing genre with the same name
    /// (compared case-insensitively).
    pub fn add_genre(&mut self, name: &str, profile: GenreProfile) -> Result<(), PhraseBankError> {
        validate_profile(name, &profile)?;
        let name = name.trim().to_string();
        let key = name.to_lowercase();
        match self.index.get(&key) {
            Some(&i) => self.genres[i] = (name, profile),
            None => self.genres.push((name, profile)),
        }
        self.genres.sort_by(|a, b| a.0.cmp(&b.0));
        self.index = self
            .genres
            .iter()
            .enumerate()
            .map(|(i, (n, _))| (n.to_lowercase(), i))
            .collect();
        Ok(())
    }

    /// Canonical name and profile for a recognized genre.
    pub fn lookup(&self, genre: &str) -> Option<(&str, &GenreProfile)> {
        let key = genre.trim().to_lowercase();
        self.index
            .get(&key)
            .map(|&i| (self.genres[i].0.as_str(), &self.genres[i].1))
    }

    /// Canonical name of a recognized genre, e.g. `"mystery"` → `"Mystery"`.
    pub fn canonical_name(&self, genre: &str) -> Option<&str> {
        self.lookup(genre).map(|(name, _)| name)
    }

    /// Canonical name and profile for `genre`, or the default genre's when
    /// the name is not recognized.
    pub fn resolve(&self, genre: &str) -> (&str, &GenreProfile) {
        match self.lookup(genre) {
            Some(found) => found,
            None => {
                tracing::warn!(genre, fallback = %self.default_genre, "unknown genre, using default profile");
                self.default_entry()
            }
        }
    }

    /// Profile for `genre`, falling back to the default profile.
    pub fn profile(&self, genre: &str) -> &GenreProfile {
        self.resolve(genre).1
    }

    pub fn default_genre(&self) -> &str {
        &self.default_genre
    }

    fn default_entry(&self) -> (&str, &GenreProfile) {
        // The default genre is checked at load and genres are never removed.
        let i = self.index[&self.default_genre.to_lowercase()];
        (self.genres[i].0.as_str(), &self.genres[i].1)
    }

    /// Canonical genre names, sorted.
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn genres(&self) -> impl Iterator<Item = (&str, &GenreProfile)> {
        self.genres.iter().map(|(n, p)| (n.as_str(), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_loads() {
        let bank = PhraseBank::builtin().unwrap();
        assert_eq!(bank.default_genre(), "Adventure");
        assert_eq!(
            bank.genre_names(),
            vec![
                "Adventure",
                "Comedy",
                "Drama",
                "Fantasy",
                "Horror",
                "Mystery",
                "Romance",
                "Science Fiction",
            ]
        );
        assert_eq!(bank.pools.surprise_topics.len(), 8);
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let bank = PhraseBank::builtin().unwrap();
        let (name, profile) = bank.lookup("  science fiction ").unwrap();
        assert_eq!(name, "Science Fiction");
        assert_eq!(profile.tone, "curious, speculative");
        assert!(bank.lookup("Western").is_none());
        assert_eq!(bank.canonical_name("MYSTERY"), Some("Mystery"));
        assert_eq!(bank.canonical_name("Western"), None);
    }

    #[test]
    fn unknown_genre_resolves_to_default() {
        let bank = PhraseBank::builtin().unwrap();
        let (name, profile) = bank.resolve("Unknown");
        assert_eq!(name, "Adventure");
        assert_eq!(profile, bank.profile("Adventure"));
        assert_eq!(bank.profile(""), bank.profile("Adventure"));
    }

    #[test]
    fn missing_default_genre_is_an_error() {
        let ron = BUILTIN_RON.replace("default_genre: \"Adventure\"", "default_genre: \"Western\"");
        assert!(matches!(
            PhraseBank::parse_ron(&ron),
            Err(PhraseBankError::MissingDefaultGenre(name)) if name == "Western"
        ));
    }

    #[test]
    fn bad_template_names_its_pool() {
        let ron = BUILTIN_RON.replace("It made the earlier choices", "It made {the} earlier choices");
        match PhraseBank::parse_ron(&ron) {
            Err(PhraseBankError::Template { pool, source }) => {
                assert_eq!(pool, "scaffold.twist_coda");
                assert_eq!(source, TemplateError::UnknownSlot("the".to_string()));
            }
            other => panic!("expected template error, got {:?}", other),
        }
    }

    #[test]
    fn merged_genre_is_resolvable() {
        let mut bank = PhraseBank::builtin().unwrap();
        let extra = PhraseBank::parse_genres_ron(
            r#"{
                "Western": (
                    tone: "dusty, laconic",
                    settings: ["a one-street town"],
                    hooks: ["The stranger rode in at noon."],
                    conflicts: ["a land dispute"],
                    style: "spare",
                ),
            }"#,
        )
        .unwrap();
        for (name, profile) in extra {
            bank.add_genre(&name, profile).unwrap();
        }
        assert_eq!(bank.resolve("western").0, "Western");
        assert_eq!(bank.genre_names().len(), 9);
        assert_eq!(bank.resolve("Mystery").0, "Mystery");
    }

    #[test]
    fn empty_genre_pool_is_rejected() {
        let mut bank = PhraseBank::builtin().unwrap();
        let profile = GenreProfile {
            tone: "flat".to_string(),
            settings: vec![],
            hooks: vec!["Hook.".to_string()],
            conflicts: vec!["a problem".to_string()],
            style: "plain".to_string(),
        };
        assert!(matches!(
            bank.add_genre("Empty", profile),
            Err(PhraseBankError::EmptyPool(pool)) if pool == "Empty.settings"
        ));
    }
}
