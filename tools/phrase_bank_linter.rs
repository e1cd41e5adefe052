/// Phrase Bank Linter: validates a phrase bank and reports variety problems.
///
/// Usage: phrase_bank_linter <phrase_bank.ron> [--genres <file.ron>]...

use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;

use storysmith::core::phrase_bank::PhraseBank;
use storysmith::core::template::Slot;

/// Pools smaller than this make stories repeat quickly.
const MIN_VARIETY: usize = 3;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: phrase_bank_linter <phrase_bank.ron> [--genres <file.ron>]...");
        process::exit(0);
    }

    let bank_path = Path::new(&args[1]);
    let mut bank = match PhraseBank::load_from_ron(bank_path) {
        Ok(bank) => bank,
        Err(e) => {
            eprintln!("ERROR: Failed to load phrase bank: {}", e);
            process::exit(1);
        }
    };

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--genres" && i + 1 < args.len() {
            i += 1;
            if let Err(e) = bank.merge_genres_from_ron(Path::new(&args[i])) {
                eprintln!("ERROR: Failed to load genres from {}: {}", args[i], e);
                process::exit(1);
            }
        }
        i += 1;
    }

    println!("Loaded {} genres", bank.genre_names().len());

    let (errors, warnings) = lint_bank(&bank);

    println!("\n=== Phrase Bank Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_bank(bank: &PhraseBank) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (genre, profile) in bank.genres() {
        for (pool, entries) in profile.pools() {
            let name = format!("{}.{}", genre, pool);
            check_variety(&name, entries.len(), &mut warnings);
            check_duplicates(&name, entries.iter().map(String::as_str), &mut warnings);
        }
        for setting in &profile.settings {
            // Settings are spliced mid-sentence.
            if setting.ends_with('.') {
                warnings.push(format!(
                    "Genre '{}' setting '{}' ends with a period",
                    genre, setting
                ));
            }
        }
    }

    for (pool, entries) in bank.pools.phrase_pools() {
        check_variety(pool, entries.len(), &mut warnings);
        check_duplicates(pool, entries.iter().map(String::as_str), &mut warnings);
    }

    for (pool, templates) in bank.pools.template_pools() {
        check_variety(pool, templates.len(), &mut warnings);
        let sources: Vec<String> = templates.iter().map(|t| t.to_string()).collect();
        check_duplicates(pool, sources.iter().map(String::as_str), &mut warnings);

        for (source, template) in sources.iter().zip(templates) {
            if !source.trim_end().ends_with(['.', '!', '?', '"']) {
                errors.push(format!(
                    "Template in '{}' does not end a sentence: \"{}\"",
                    pool, source
                ));
            }
            // Action paragraphs open on the topic.
            if pool == "action_leads" && !template.slots().any(|s| s == Slot::Topic) {
                warnings.push(format!(
                    "Action lead never mentions the topic: \"{}\"",
                    source
                ));
            }
        }
    }

    (errors, warnings)
}

fn check_variety(pool: &str, len: usize, warnings: &mut Vec<String>) {
    if len < MIN_VARIETY {
        warnings.push(format!(
            "Pool '{}' has only {} entries (minimum {} recommended)",
            pool, len, MIN_VARIETY
        ));
    }
}

fn check_duplicates<'a>(
    pool: &str,
    entries: impl Iterator<Item = &'a str>,
    warnings: &mut Vec<String>,
) {
    let mut seen = FxHashSet::default();
    for entry in entries {
        if !seen.insert(entry.trim().to_lowercase()) {
            warnings.push(format!("Pool '{}' repeats \"{}\"", pool, entry));
        }
    }
}
