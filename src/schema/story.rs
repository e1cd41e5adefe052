use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::text::word_count;

/// Separator between the title and paragraphs, and between paragraphs.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// A finished story: a title and its paragraphs, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl Story {
    /// Split serialized text back into title and paragraphs.
    pub fn from_text(text: &str) -> Story {
        let mut blocks = text
            .split(PARAGRAPH_BREAK)
            .map(str::trim)
            .filter(|b| !b.is_empty());
        let title = blocks.next().unwrap_or_default().to_string();
        Story {
            title,
            paragraphs: blocks.map(str::to_string).collect(),
        }
    }

    /// Title followed by blank-line-separated paragraphs.
    pub fn render(&self) -> String {
        let mut out = self.title.clone();
        for paragraph in &self.paragraphs {
            out.push_str(PARAGRAPH_BREAK);
            out.push_str(paragraph);
        }
        out
    }

    /// Words in the rendered story, title included.
    pub fn word_count(&self) -> usize {
        word_count(&self.title) + self.paragraphs.iter().map(|p| word_count(p)).sum::<usize>()
    }
}

impl fmt::Display for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_and_split_agree() {
        let story = Story {
            title: "Horror — A blue kite".to_string(),
            paragraphs: vec!["It waited.".to_string(), "Then it left.".to_string()],
        };
        let text = story.render();
        assert_eq!(text, "Horror — A blue kite\n\nIt waited.\n\nThen it left.");
        assert_eq!(Story::from_text(&text), story);
        assert_eq!(story.word_count(), 10);
    }

    #[test]
    fn from_text_without_breaks_is_all_title() {
        let story = Story::from_text("Just one line…");
        assert_eq!(story.title, "Just one line…");
        assert!(story.paragraphs.is_empty());
    }
}
