/// Runtime configuration, loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::composer::{ComposerSettings, StoryComposer};
use crate::core::phrase_bank::{PhraseBank, PhraseBankError};
use crate::schema::request::LengthTier;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("phrase bank error: {0}")]
    PhraseBank(#[from] PhraseBankError),
}

/// Every field is optional in the file; missing ones take their defaults.
///
/// ```ron
/// StorysmithConfig(
///     phrase_bank: Some("genre_data/phrase_bank.ron"),
///     extra_genres: ["my_genres.ron"],
///     reveal_speed: 30,
///     default_genre: Some("Mystery"),
///     default_length: long,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorysmithConfig {
    /// Phrase bank file; the built-in bank when unset.
    pub phrase_bank: Option<PathBuf>,
    /// Genre maps merged over the bank, in order.
    pub extra_genres: Vec<PathBuf>,
    /// Typewriter speed on the 0–80 scale.
    pub reveal_speed: u32,
    /// Where `save` writes story files.
    pub export_dir: PathBuf,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
    /// Initial genre of the form; the bank's default when unset.
    pub default_genre: Option<String>,
    pub default_length: LengthTier,
    pub composer: ComposerSettings,
}

impl Default for StorysmithConfig {
    fn default() -> Self {
        Self {
            phrase_bank: None,
            extra_genres: Vec::new(),
            reveal_speed: 18,
            export_dir: PathBuf::from("."),
            seed: None,
            default_genre: None,
            default_length: LengthTier::default(),
            composer: ComposerSettings::default(),
        }
    }
}

impl StorysmithConfig {
    pub fn load_from_ron(path: &Path) -> Result<StorysmithConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse_ron(&contents)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse_ron(input: &str) -> Result<StorysmithConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// The configured phrase bank with any extra genres merged in.
    pub fn build_bank(&self) -> Result<PhraseBank, ConfigError> {
        let mut bank = match &self.phrase_bank {
            Some(path) => PhraseBank::load_from_ron(path)?,
            None => PhraseBank::builtin()?,
        };
        for path in &self.extra_genres {
            bank.merge_genres_from_ron(path)?;
        }
        Ok(bank)
    }

    pub fn build_composer(&self) -> Result<StoryComposer, ConfigError> {
        Ok(StoryComposer::with_settings(self.build_bank()?, self.composer.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = StorysmithConfig::parse_ron("()").unwrap();
        assert_eq!(config, StorysmithConfig::default());
        assert_eq!(config.reveal_speed, 18);
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.composer.max_body_paragraphs, 12);
    }

    #[test]
    fn partial_config_overrides_fields() {
        let input = r#"StorysmithConfig(
            reveal_speed: 40,
            seed: Some(7),
            default_genre: Some("Horror"),
            default_length: long,
            composer: (fill_ratio: 0.9),
        )"#;
        let config = StorysmithConfig::parse_ron(input).unwrap();
        assert_eq!(config.reveal_speed, 40);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.default_genre.as_deref(), Some("Horror"));
        assert_eq!(config.default_length, LengthTier::Long);
        assert_eq!(config.composer.fill_ratio, 0.9);
        assert_eq!(config.composer.filler_weights, [4, 3, 3]);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = StorysmithConfig::parse_ron("StorysmithConfig(reveal_speed: \"fast\")").unwrap_err();
        assert!(matches!(err, ConfigError::Ron(_)));
    }

    #[test]
    fn extra_genres_are_merged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "Western": (
                    tone: "dusty",
                    settings: ["a dry creek bed"],
                    hooks: ["The stagecoach was late."],
                    conflicts: ["the sheriff vanished"],
                    style: "laconic",
                ),
            }}"#
        )
        .unwrap();

        let config = StorysmithConfig {
            extra_genres: vec![file.path().to_path_buf()],
            ..StorysmithConfig::default()
        };
        let bank = config.build_bank().unwrap();
        assert!(bank.lookup("western").is_some());
        assert!(bank.lookup("Mystery").is_some());
    }

    #[test]
    fn missing_phrase_bank_file_is_io_error() {
        let config = StorysmithConfig {
            phrase_bank: Some(PathBuf::from("/definitely/not/here.ron")),
            ..StorysmithConfig::default()
        };
        let err = config.build_composer().unwrap_err();
        assert!(matches!(err, ConfigError::PhraseBank(PhraseBankError::Io(_))));
    }
}
