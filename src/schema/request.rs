use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Topic used when the caller leaves the topic blank.
pub const PLACEHOLDER_TOPIC: &str = "an ordinary object";

/// Coarse story length chosen by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthTier {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthTier {
    pub const ALL: [LengthTier; 3] = [LengthTier::Short, LengthTier::Medium, LengthTier::Long];

    /// Parse a tier name, case-insensitively. Anything unrecognized is `Medium`.
    pub fn parse(s: &str) -> LengthTier {
        match s.trim().to_lowercase().as_str() {
            "short" => LengthTier::Short,
            "long" => LengthTier::Long,
            _ => LengthTier::Medium,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    /// Inclusive word-count range a target is drawn from.
    pub fn word_range(&self) -> RangeInclusive<usize> {
        match self {
            Self::Short => 220..=279,
            Self::Medium => 520..=699,
            Self::Long => 900..=1139,
        }
    }

    /// Draw a target word count uniformly from this tier's range.
    pub fn target_word_count<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.word_range())
    }
}

impl fmt::Display for LengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the composer needs for one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub genre: String,
    pub target_words: usize,
}

impl GenerationRequest {
    /// Build a request, normalizing inputs: whitespace runs (line breaks
    /// included) collapse to single spaces, a blank topic becomes
    /// [`PLACEHOLDER_TOPIC`], and the target is at least one word.
    pub fn new(topic: &str, genre: &str, target_words: usize) -> Self {
        let topic = collapse_whitespace(topic);
        Self {
            topic: if topic.is_empty() {
                PLACEHOLDER_TOPIC.to_string()
            } else {
                topic
            },
            genre: collapse_whitespace(genre),
            target_words: target_words.max(1),
        }
    }
}

/// Single-line form of free text. Topics and genres land in the title and
/// in running prose, where a blank line would start a new paragraph.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tier_parsing_defaults_to_medium() {
        assert_eq!(LengthTier::parse("short"), LengthTier::Short);
        assert_eq!(LengthTier::parse(" LONG "), LengthTier::Long);
        assert_eq!(LengthTier::parse("medium"), LengthTier::Medium);
        assert_eq!(LengthTier::parse("epic"), LengthTier::Medium);
        assert_eq!(LengthTier::parse(""), LengthTier::Medium);
    }

    #[test]
    fn targets_stay_in_tier_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for tier in LengthTier::ALL {
            for _ in 0..200 {
                let n = tier.target_word_count(&mut rng);
                assert!(tier.word_range().contains(&n), "{} out of range for {}", n, tier);
            }
        }
    }

    #[test]
    fn request_normalizes_inputs() {
        let req = GenerationRequest::new("   ", " Mystery ", 0);
        assert_eq!(req.topic, PLACEHOLDER_TOPIC);
        assert_eq!(req.genre, "Mystery");
        assert_eq!(req.target_words, 1);

        let req = GenerationRequest::new(" a blue kite ", "Comedy", 250);
        assert_eq!(req.topic, "a blue kite");
        assert_eq!(req.target_words, 250);
    }

    #[test]
    fn request_keeps_topic_on_one_line() {
        let req = GenerationRequest::new("old map\n\n  second\tline ", "Science\nFiction", 600);
        assert_eq!(req.topic, "old map second line");
        assert_eq!(req.genre, "Science Fiction");
    }
}
