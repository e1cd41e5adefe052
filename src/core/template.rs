/// Sentence templates: `{slot}` parsing and rendering.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::phrase_bank::StoryPools;
use crate::core::text::capitalize_first;
use crate::schema::genre::GenreProfile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Parse(String),
    #[error("unknown slot '{{{0}}}'")]
    UnknownSlot(String),
}

/// A named placeholder filled at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// The request topic, verbatim.
    Topic,
    /// `a` or `an`, chosen from the topic's first letter.
    Article,
    /// A random character role from the shared pools.
    Role,
    /// A random action verb from the shared pools.
    Verb,
    /// A random setting from the genre profile.
    Setting,
    /// A random conflict from the genre profile.
    Conflict,
}

impl Slot {
    pub fn from_name(name: &str) -> Option<Slot> {
        match name {
            "topic" => Some(Slot::Topic),
            "article" => Some(Slot::Article),
            "role" => Some(Slot::Role),
            "verb" => Some(Slot::Verb),
            "setting" => Some(Slot::Setting),
            "conflict" => Some(Slot::Conflict),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Slot::Topic => "topic",
            Slot::Article => "article",
            Slot::Role => "role",
            Slot::Verb => "verb",
            Slot::Setting => "setting",
            Slot::Conflict => "conflict",
        }
    }
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A placeholder: `{topic}`, `{verb}`, ...
    Slot(Slot),
}

/// A parsed sentence template: a sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<Segment>,
}

/// Everything a template may draw from while rendering.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub topic: &'a str,
    pub article: &'static str,
    pub profile: &'a GenreProfile,
    pub pools: &'a StoryPools,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{topic}`, `{article}`, `{role}`, `{verb}`, `{setting}`, `{conflict}` → `Slot`
    /// - `{{` / `}}` → literal braces
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = input;

        while let Some(pos) = rest.find(['{', '}']) {
            text.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix("{{").or_else(|| tail.strip_prefix("}}")) {
                text.push_str(&tail[..1]);
                rest = after;
                continue;
            }
            let at = input.len() - tail.len();
            if tail.starts_with('}') {
                return Err(TemplateError::Parse(format!("stray '}}' at byte {}", at)));
            }

            let (name, after) = tail[1..].split_once('}').ok_or_else(|| {
                TemplateError::Parse(format!("'{{' at byte {} is never closed", at))
            })?;
            let slot = slot_named(name)?;
            if !text.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut text)));
            }
            segments.push(Segment::Slot(slot));
            rest = after;
        }

        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Literal(text));
        }
        Ok(Template { segments })
    }

    /// Iterate over the slots this template references.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(slot) => Some(*slot),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template as a sentence: slots filled, first letter upper-cased.
    pub fn render<R: Rng + ?Sized>(&self, scope: &Scope<'_>, rng: &mut R) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => out.push_str(fill(*slot, scope, rng)),
            }
        }
        capitalize_first(&out)
    }
}

fn slot_named(name: &str) -> Result<Slot, TemplateError> {
    if name.is_empty() || name.contains('{') {
        return Err(TemplateError::Parse(format!("malformed slot '{{{}}}'", name)));
    }
    Slot::from_name(name).ok_or_else(|| TemplateError::UnknownSlot(name.to_string()))
}

fn fill<'a, R: Rng + ?Sized>(slot: Slot, scope: &Scope<'a>, rng: &mut R) -> &'a str {
    match slot {
        Slot::Topic => scope.topic,
        Slot::Article => scope.article,
        Slot::Role => pick(&scope.pools.roles, rng),
        Slot::Verb => pick(&scope.pools.verbs, rng),
        Slot::Setting => pick(&scope.profile.settings, rng),
        Slot::Conflict => pick(&scope.profile.conflicts, rng),
    }
}

/// Uniform pick from a pool; empty pools are rejected at load, so `""` is unreachable in practice.
pub(crate) fn pick<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> &'a str {
    pool.choose(rng).map(String::as_str).unwrap_or_default()
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => write!(f, "{}", text.replace('{', "{{").replace('}', "}}"))?,
                Segment::Slot(slot) => write!(f, "{{{}}}", slot.name())?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phrase_bank::PhraseBank;
    use rand::rngs::mock::StepRng;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.").unwrap();
        assert_eq!(t.segments, vec![Segment::Literal("Hello, world.".to_string())]);
    }

    #[test]
    fn parse_slots() {
        let t = Template::parse("It began with {article} {topic}.").unwrap();
        assert_eq!(
            t.segments,
            vec![
                Segment::Literal("It began with ".to_string()),
                Segment::Slot(Slot::Article),
                Segment::Literal(" ".to_string()),
                Segment::Slot(Slot::Topic),
                Segment::Literal(".".to_string()),
            ]
        );
        assert_eq!(t.slots().collect::<Vec<_>>(), vec![Slot::Article, Slot::Topic]);
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(t.segments, vec![Segment::Literal("Use {braces} here.".to_string())]);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(Template::parse("Bad {} here"), Err(TemplateError::Parse(_))));
        assert!(matches!(Template::parse("Bad {outer{inner}} here"), Err(TemplateError::Parse(_))));
        assert!(matches!(Template::parse("Bad {unclosed here"), Err(TemplateError::Parse(_))));
        assert!(matches!(Template::parse("Bad } here"), Err(TemplateError::Parse(_))));
        assert_eq!(
            Template::parse("Who is {villain}?"),
            Err(TemplateError::UnknownSlot("villain".to_string()))
        );
        assert_eq!(
            Template::parse("Oops }"),
            Err(TemplateError::Parse("stray '}' at byte 5".to_string()))
        );
    }

    #[test]
    fn escapes_next_to_slots() {
        let t = Template::parse("{{{topic}}}").unwrap();
        assert_eq!(
            t.segments,
            vec![
                Segment::Literal("{".to_string()),
                Segment::Slot(Slot::Topic),
                Segment::Literal("}".to_string()),
            ]
        );
    }

    #[test]
    fn display_round_trips_source() {
        let src = "Someone {verb} past {{the}} {setting}.";
        let t = Template::parse(src).unwrap();
        assert_eq!(t.to_string(), src);
    }

    #[test]
    fn render_fills_and_capitalizes() {
        let bank = PhraseBank::builtin().unwrap();
        let scope = Scope {
            topic: "old lantern",
            article: "an",
            profile: bank.profile("Adventure"),
            pools: &bank.pools,
        };
        let t = Template::parse("{setting} hid {article} {topic}.").unwrap();
        let mut rng = StepRng::new(0, 0);
        assert_eq!(t.render(&scope, &mut rng), "A sun-bleached port hid an old lantern.");
    }
}
