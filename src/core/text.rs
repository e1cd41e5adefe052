/// Plain-text helpers: word counting, sentence boundaries, trimming.

/// Marker appended when trimming has to cut mid-sentence.
pub const ELLIPSIS: char = '…';

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `"an"` when the first non-space character is a vowel (ASCII, any case), else `"a"`.
pub fn article_for(noun: &str) -> &'static str {
    match noun.trim_start().chars().next() {
        Some(c) if matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// File-name base for a topic: whitespace runs become `_`, lower-cased,
/// `"story"` when blank.
pub fn slugify(topic: &str) -> String {
    let slug = topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    if slug.is_empty() {
        "story".to_string()
    } else {
        slug
    }
}

/// Byte offsets just past each sentence in `text`.
///
/// A sentence ends at `.`, `?` or `!` when followed by whitespace; the end
/// of the text always closes the last sentence.
pub fn sentence_ends(text: &str) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut iter = text.char_indices().peekable();
    while let Some((idx, c)) = iter.next() {
        if matches!(c, '.' | '?' | '!') {
            if let Some(&(_, next)) = iter.peek() {
                if next.is_whitespace() {
                    ends.push(idx + c.len_utf8());
                }
            }
        }
    }
    let trimmed_end = text.trim_end().len();
    if ends.last() != Some(&trimmed_end) && trimmed_end > 0 {
        ends.push(trimmed_end);
    }
    ends
}

/// Byte offset just past the `n`-th word (1-based), or the text length.
fn end_of_word(text: &str, n: usize) -> usize {
    let mut seen = 0;
    let mut in_word = false;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                seen += 1;
                if seen == n {
                    return idx;
                }
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }
    text.len()
}

/// Shorten `text` to at most `target` words.
///
/// Text already within the target is returned unchanged. Otherwise the
/// longest prefix ending on a sentence boundary that fits is kept; if not even
/// the first sentence fits, the text is cut after the `target`-th word and
/// [`ELLIPSIS`] is appended. Prefixes keep their original whitespace, so
/// paragraph breaks survive, and trimming an already-trimmed text is a no-op.
pub fn trim_to_word_target(text: &str, target: usize) -> String {
    if word_count(text) <= target {
        return text.to_string();
    }
    if target == 0 {
        return String::new();
    }

    let mut keep = 0;
    for end in sentence_ends(text) {
        if word_count(&text[..end]) > target {
            break;
        }
        keep = end;
    }

    if keep > 0 {
        return text[..keep].to_string();
    }

    let cut = end_of_word(text.trim_start(), target);
    let start = text.len() - text.trim_start().len();
    let mut out = text[start..start + cut].trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn word_count_ignores_runs_of_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one  two\n\nthree\t four "), 4);
    }

    #[test]
    fn article_follows_first_letter() {
        assert_eq!(article_for("apple"), "an");
        assert_eq!(article_for("Umbrella"), "an");
        assert_eq!(article_for("  old map"), "an");
        assert_eq!(article_for("broken compass"), "a");
        assert_eq!(article_for("a broken compass"), "an");
        assert_eq!(article_for(""), "a");
    }

    #[test]
    fn capitalize_first_handles_edges() {
        assert_eq!(capitalize_first("a broken compass"), "A broken compass");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("éclair"), "Éclair");
    }

    #[test]
    fn slugify_topic() {
        assert_eq!(slugify("A Broken  Compass"), "a_broken_compass");
        assert_eq!(slugify("   "), "story");
    }

    #[test]
    fn sentence_ends_need_trailing_whitespace() {
        let text = "One. Two? Three!\n\nv1.2 stays whole.";
        let ends = sentence_ends(text);
        let pieces: Vec<&str> = ends.iter().map(|&e| &text[..e]).collect();
        assert_eq!(
            pieces,
            vec![
                "One.",
                "One. Two?",
                "One. Two? Three!",
                "One. Two? Three!\n\nv1.2 stays whole.",
            ]
        );
    }

    #[test]
    fn trim_keeps_text_within_target() {
        let text = "Title\n\nShort story here.";
        assert_eq!(trim_to_word_target(text, 10), text);
    }

    #[test]
    fn trim_drops_trailing_sentences() {
        let text = "Title line\n\nFirst sentence here. Second one too.\n\nThird is long enough.";
        let out = trim_to_word_target(text, 9);
        assert_eq!(out, "Title line\n\nFirst sentence here. Second one too.");
        assert_eq!(word_count(&out), 8);
    }

    #[test]
    fn trim_falls_back_to_words_with_ellipsis() {
        let text = "A very long opening sentence that never seems to end at all.";
        let out = trim_to_word_target(text, 4);
        assert_eq!(out, "A very long opening…");
        assert_eq!(word_count(&out), 4);
    }

    proptest! {
        #[test]
        fn trim_never_exceeds_target(
            words in prop::collection::vec("[a-z]{1,8}[.?!]?", 1..120),
            target in 1usize..80,
        ) {
            let text = words.join(" ");
            let out = trim_to_word_target(&text, target);
            prop_assert!(word_count(&out) <= target);
            prop_assert!(text.starts_with(out.trim_end_matches(ELLIPSIS)));
        }

        #[test]
        fn trim_is_idempotent(
            words in prop::collection::vec("[a-z]{1,8}[.?!]?", 1..120),
            target in 1usize..80,
        ) {
            let text = words.join(" ");
            let once = trim_to_word_target(&text, target);
            let twice = trim_to_word_target(&once, target);
            prop_assert_eq!(once, twice);
        }
    }
}
