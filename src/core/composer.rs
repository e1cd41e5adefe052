/// The story composer: request → title + paragraphs → trimmed text.
///
/// Wires together genre resolution, template rendering, the filler loop and
/// the final word-count trim.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::phrase_bank::PhraseBank;
use crate::core::template::{pick, Scope, Template};
use crate::core::text::{article_for, capitalize_first, trim_to_word_target, word_count};
use crate::schema::genre::GenreProfile;
use crate::schema::request::GenerationRequest;
use crate::schema::story::Story;

/// Kind of paragraph appended between the scene and the climax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillerKind {
    /// A verb-driven lead sentence followed by escalation.
    Action,
    /// Introspective sentence pairs.
    Reflection,
    /// Reveals, closed by the twist coda.
    Twist,
}

impl FillerKind {
    pub const ALL: [FillerKind; 3] = [FillerKind::Action, FillerKind::Reflection, FillerKind::Twist];
}

/// Tunables of the composition loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// Filler paragraphs are added while the body is below this share of the target.
    pub fill_ratio: f64,
    /// Hard cap on paragraphs before the climax.
    pub max_body_paragraphs: usize,
    /// Relative weights of action, reflection and twist paragraphs.
    pub filler_weights: [u32; 3],
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            fill_ratio: 0.95,
            max_body_paragraphs: 12,
            filler_weights: [4, 3, 3],
        }
    }
}

/// Assembles stories from a [`PhraseBank`].
///
/// Composition never fails: unknown genres use the default profile and blank
/// topics use [`PLACEHOLDER_TOPIC`](crate::schema::request::PLACEHOLDER_TOPIC).
/// All randomness comes from the `rng` passed in, so a seeded generator gives
/// reproducible stories.
#[derive(Debug, Clone)]
pub struct StoryComposer {
    bank: PhraseBank,
    settings: ComposerSettings,
}

#[derive(Debug, Default)]
struct ParagraphBuilder {
    sentences: Vec<String>,
    words: usize,
}

impl ParagraphBuilder {
    fn push(&mut self, sentence: String) {
        self.words += word_count(&sentence);
        self.sentences.push(sentence);
    }

    fn finish(self) -> String {
        self.sentences.join(" ")
    }
}

fn shuffled<'t, R: Rng + ?Sized>(pool: &'t [Template], rng: &mut R) -> Vec<&'t Template> {
    let mut order: Vec<&Template> = pool.iter().collect();
    order.shuffle(rng);
    order
}

fn render_any<R: Rng + ?Sized>(pool: &[Template], scope: &Scope<'_>, rng: &mut R) -> String {
    pool.choose(rng)
        .map(|t| t.render(scope, rng))
        .unwrap_or_default()
}

impl StoryComposer {
    pub fn new(bank: PhraseBank) -> Self {
        Self::with_settings(bank, ComposerSettings::default())
    }

    pub fn with_settings(bank: PhraseBank, settings: ComposerSettings) -> Self {
        Self { bank, settings }
    }

    pub fn bank(&self) -> &PhraseBank {
        &self.bank
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// Compose a story and trim it to the request's target word count.
    pub fn compose<R: Rng + ?Sized>(&self, request: &GenerationRequest, rng: &mut R) -> Story {
        let draft = self.draft(request, rng);
        let full = draft.render();
        let trimmed = trim_to_word_target(&full, request.target_words);
        tracing::debug!(
            genre = %request.genre,
            target = request.target_words,
            paragraphs = draft.paragraphs.len(),
            drafted = word_count(&full),
            kept = word_count(&trimmed),
            "composed story"
        );
        Story::from_text(&trimmed)
    }

    /// [`compose`](Self::compose), serialized as title + blank-line-separated paragraphs.
    pub fn compose_text<R: Rng + ?Sized>(&self, request: &GenerationRequest, rng: &mut R) -> String {
        self.compose(request, rng).render()
    }

    /// Compose with a generator seeded from `seed`.
    pub fn compose_seeded(&self, request: &GenerationRequest, seed: u64) -> Story {
        let mut rng = StdRng::seed_from_u64(seed);
        self.compose(request, &mut rng)
    }

    /// The untrimmed story: opening, scene, fillers, climax, resolution.
    pub fn draft<R: Rng + ?Sized>(&self, request: &GenerationRequest, rng: &mut R) -> Story {
        // Requests built field by field bypass `new`.
        let request = GenerationRequest::new(&request.topic, &request.genre, request.target_words);
        let topic = request.topic.as_str();
        let (label, profile) = self.resolve_genre(&request.genre);
        let scope = Scope {
            topic,
            article: article_for(topic),
            profile,
            pools: &self.bank.pools,
        };

        let title = format!("{} — {}", label, capitalize_first(topic));
        let mut paragraphs = vec![
            self.opening(&scope, rng),
            self.scene(&scope, rng),
        ];

        let threshold = request.target_words as f64 * self.settings.fill_ratio;
        let cap = self.settings.max_body_paragraphs;
        let mut words: usize = paragraphs.iter().map(|p| word_count(p)).sum();
        let kinds = WeightedIndex::new(self.settings.filler_weights).ok();

        while (words as f64) < threshold && paragraphs.len() < cap {
            let slots_left = cap - paragraphs.len();
            let budget = ((threshold - words as f64) / slots_left as f64).ceil() as usize;
            let kind = kinds
                .as_ref()
                .map(|dist| FillerKind::ALL[dist.sample(rng)])
                .unwrap_or(FillerKind::Action);
            let paragraph = self.filler(kind, budget, &scope, rng);
            words += word_count(&paragraph);
            paragraphs.push(paragraph);
        }

        if (words as f64) < threshold {
            tracing::debug!(words, threshold, cap, "paragraph cap reached before fill threshold");
        }

        paragraphs.push(render_any(&self.bank.pools.climaxes, &scope, rng));
        paragraphs.push(render_any(&self.bank.pools.resolutions, &scope, rng));

        Story { title, paragraphs }
    }

    /// Title label and profile. Recognized genres use their canonical name,
    /// unknown ones keep the caller's name over the default profile, and a
    /// blank genre becomes the default genre.
    fn resolve_genre<'a>(&'a self, genre: &'a str) -> (&'a str, &'a GenreProfile) {
        if let Some(found) = self.bank.lookup(genre) {
            return found;
        }
        let (default_name, profile) = self.bank.resolve(genre);
        match genre.trim() {
            "" => (default_name, profile),
            typed => (typed, profile),
        }
    }

    fn opening<R: Rng + ?Sized>(&self, scope: &Scope<'_>, rng: &mut R) -> String {
        let scaffold = &self.bank.scaffold;
        let mut p = ParagraphBuilder::default();
        p.push(pick(&scope.profile.hooks, rng).to_string());
        p.push(scaffold.began.render(scope, rng));
        p.push(scaffold.unexpected.render(scope, rng));
        p.finish()
    }

    fn scene<R: Rng + ?Sized>(&self, scope: &Scope<'_>, rng: &mut R) -> String {
        let scaffold = &self.bank.scaffold;
        let mut p = ParagraphBuilder::default();
        p.push(scaffold.scene.render(scope, rng));
        p.push(render_any(&self.bank.pools.characters, scope, rng));
        p.push(scaffold.trouble.render(scope, rng));
        p.finish()
    }

    /// One filler paragraph of `kind`, grown toward `budget` words without
    /// repeating a sentence template. Always holds at least one unit.
    fn filler<R: Rng + ?Sized>(
        &self,
        kind: FillerKind,
        budget: usize,
        scope: &Scope<'_>,
        rng: &mut R,
    ) -> String {
        let pools = &self.bank.pools;
        let mut p = ParagraphBuilder::default();

        match kind {
            FillerKind::Action => {
                p.push(render_any(&pools.action_leads, scope, rng));
                for t in shuffled(&pools.escalations, rng) {
                    if p.words >= budget {
                        break;
                    }
                    p.push(t.render(scope, rng));
                }
            }
            FillerKind::Reflection => {
                let intros = shuffled(&pools.reflection_intros, rng);
                let closers = shuffled(&pools.reflection_closers, rng);
                for (intro, closer) in intros.into_iter().zip(closers) {
                    p.push(intro.render(scope, rng));
                    p.push(closer.render(scope, rng));
                    if p.words >= budget {
                        break;
                    }
                }
            }
            FillerKind::Twist => {
                let coda = self.bank.scaffold.twist_coda.render(scope, rng);
                let reserve = word_count(&coda);
                for t in shuffled(&pools.twists, rng) {
                    p.push(t.render(scope, rng));
                    if p.words + reserve >= budget {
                        break;
                    }
                }
                p.push(coda);
            }
        }

        p.finish()
    }
}
