//! Vocabulary builder: dictionary definitions plus word-shape heuristics.
//!
//! German compounds are spotted from a small table of known words and, for
//! long words, from common prefixes and suffixes. The CEFR level of a word
//! is guessed from its length.

use crate::dictionary::Dictionary;
use crate::models::{
    CompoundAnalysis, Difficulty, Level, PartKind, StepOutcome, VocabularyAnalysis, WordPart,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMMON_PREFIXES: [&str; 10] = [
    "un", "vor", "nach", "über", "unter", "aus", "ein", "ab", "an", "auf",
];
const COMMON_SUFFIXES: [&str; 8] = ["heit", "keit", "ung", "lich", "bar", "los", "voll", "isch"];

const KNOWN_COMPOUNDS: [(&str, &[&str]); 4] = [
    ("fahrzeug", &["fahr", "zeug"]),
    ("hausarbeit", &["haus", "arbeit"]),
    ("zeitschrift", &["zeit", "schrift"]),
    ("krankenhaus", &["kranken", "haus"]),
];

/// Words longer than this are treated as probable compounds.
const COMPOUND_MIN_CHARS: usize = 8;

/// Vocabulary analysis agent.
pub struct VocabularyBuilder {
    dictionary: Arc<dyn Dictionary>,
}

impl VocabularyBuilder {
    pub fn new(dictionary: Arc<dyn Dictionary>) -> Self {
        Self { dictionary }
    }

    /// Analyze `word` for a learner at `level`.
    ///
    /// Dictionary failures only cost the definitions; the heuristics still run.
    pub async fn analyze(&self, word: &str, level: Level) -> StepOutcome<VocabularyAnalysis> {
        let word = word.trim();
        if word.is_empty() {
            return StepOutcome::failed("Vocabulary analysis failed: empty word");
        }

        info!("Analyzing word: {}", word);

        let definitions = match self.dictionary.definitions(word).await {
            Ok(Some(groups)) => groups.iter().flat_map(|g| g.to_definitions()).collect(),
            Ok(None) => {
                debug!("No dictionary entry for {}", word);
                Vec::new()
            }
            Err(e) => {
                warn!("Dictionary lookup for {} failed: {}", word, e);
                Vec::new()
            }
        };

        let compound_analysis = analyze_compound(word);
        let estimated_word_level = estimate_level(word);

        StepOutcome::ok(VocabularyAnalysis {
            word: word.to_string(),
            learner_level: level,
            estimated_word_level,
            learning_tips: learning_tips(word, level, &compound_analysis),
            difficulty_assessment: assess_difficulty(estimated_word_level, level),
            compound_analysis,
            definitions,
        })
    }
}

/// Break a word into its likely parts.
pub fn analyze_compound(word: &str) -> CompoundAnalysis {
    let lower = word.to_lowercase();
    let length = word.chars().count();

    let mut analysis = CompoundAnalysis {
        original_word: word.to_string(),
        is_compound: false,
        components: Vec::new(),
        estimated_components: Vec::new(),
        word_length: length,
        complexity: "simple".to_string(),
    };

    if let Some((_, parts)) = KNOWN_COMPOUNDS.iter().find(|(w, _)| *w == lower) {
        analysis.is_compound = true;
        analysis.complexity = "compound".to_string();
        analysis.components = parts.iter().map(|p| p.to_string()).collect();
        analysis.estimated_components = parts
            .iter()
            .enumerate()
            .map(|(i, part)| WordPart {
                part: part.to_string(),
                kind: PartKind::Root,
                meaning: format!("word part {}: '{}'", i + 1, part),
            })
            .collect();
    } else if length > COMPOUND_MIN_CHARS {
        analysis.is_compound = true;
        analysis.complexity = "compound".to_string();

        if let Some(prefix) = COMMON_PREFIXES.iter().find(|p| lower.starts_with(*p)) {
            analysis.estimated_components.push(WordPart {
                part: prefix.to_string(),
                kind: PartKind::Prefix,
                meaning: format!("prefix '{}'", prefix),
            });
        }
        if let Some(suffix) = COMMON_SUFFIXES.iter().find(|s| lower.ends_with(*s)) {
            analysis.estimated_components.push(WordPart {
                part: suffix.to_string(),
                kind: PartKind::Suffix,
                meaning: format!("suffix '{}'", suffix),
            });
        }
    }

    analysis
}

/// Guess the CEFR level of a word from its length.
pub fn estimate_level(word: &str) -> Level {
    match word.chars().count() {
        0..=4 => Level::A1,
        5..=6 => Level::A2,
        7..=8 => Level::B1,
        9..=12 => Level::B2,
        13..=16 => Level::C1,
        _ => Level::C2,
    }
}

/// Compare a word's level to the learner's.
pub fn assess_difficulty(word_level: Level, learner_level: Level) -> Difficulty {
    if word_level <= learner_level {
        Difficulty::Appropriate
    } else if word_level.index() == learner_level.index() + 1 {
        Difficulty::Challenging
    } else {
        Difficulty::Advanced
    }
}

pub fn learning_tips(word: &str, learner_level: Level, compound: &CompoundAnalysis) -> Vec<String> {
    let mut tips = Vec::new();

    if compound.is_compound {
        tips.push("This is a compound word - try to break it into smaller parts".to_string());
        if !compound.estimated_components.is_empty() {
            let parts: Vec<&str> = compound
                .estimated_components
                .iter()
                .map(|c| c.part.as_str())
                .collect();
            tips.push(format!("Look for these word parts: {}", parts.join(", ")));
        }
    }

    if learner_level.is_beginner() {
        tips.push("Focus on the basic meaning first, don't worry about all the nuances".to_string());
        if word.chars().count() > COMPOUND_MIN_CHARS {
            tips.push(
                "This word might be challenging at your level - learn the simpler parts first"
                    .to_string(),
            );
        }
    } else if learner_level.is_intermediate() {
        tips.push("Try to use this word in different sentence contexts".to_string());
        if compound.is_compound {
            tips.push("Practice creating your own compound words with these parts".to_string());
        }
    } else {
        tips.push("Explore the etymology and subtle meaning differences".to_string());
        tips.push("Look for related words in the same word family".to_string());
    }

    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::FakeDictionary;

    #[test]
    fn test_known_compound() {
        let analysis = analyze_compound("Fahrzeug");
        assert!(analysis.is_compound);
        assert_eq!(analysis.components, vec!["fahr", "zeug"]);
        assert_eq!(analysis.estimated_components[1].kind, PartKind::Root);
        assert_eq!(analysis.estimated_components[0].meaning, "word part 1: 'fahr'");
        assert_eq!(analysis.word_length, 8);
    }

    #[test]
    fn test_long_word_heuristic() {
        let analysis = analyze_compound("Unabhängigkeit");
        assert!(analysis.is_compound);
        assert!(analysis.components.is_empty());
        let parts: Vec<_> = analysis
            .estimated_components
            .iter()
            .map(|c| (c.part.as_str(), c.kind))
            .collect();
        assert_eq!(parts, vec![("un", PartKind::Prefix), ("keit", PartKind::Suffix)]);
    }

    #[test]
    fn test_short_word_is_simple() {
        let analysis = analyze_compound("Haus");
        assert!(!analysis.is_compound);
        assert_eq!(analysis.complexity, "simple");
        assert!(analysis.estimated_components.is_empty());
    }

    #[test]
    fn test_umlauts_count_as_single_characters() {
        // "Übung" is 5 characters but 6 bytes.
        assert_eq!(estimate_level("Übung"), Level::A2);
        // "Brötchen" is 8 characters but 9 bytes.
        assert!(!analyze_compound("Brötchen").is_compound);
    }

    #[test]
    fn test_estimate_level_boundaries() {
        assert_eq!(estimate_level("Haus"), Level::A1);
        assert_eq!(estimate_level("Mutter"), Level::A2);
        assert_eq!(estimate_level("Fahrzeug"), Level::B1);
        assert_eq!(estimate_level("Zeitschrift"), Level::B2);
        assert_eq!(estimate_level("Auseinandersetzung"), Level::C2);
        assert_eq!(estimate_level("Umweltschutzes"), Level::C1);
    }

    #[test]
    fn test_assess_difficulty() {
        assert_eq!(assess_difficulty(Level::A2, Level::B1), Difficulty::Appropriate);
        assert_eq!(assess_difficulty(Level::B1, Level::B1), Difficulty::Appropriate);
        assert_eq!(assess_difficulty(Level::B2, Level::B1), Difficulty::Challenging);
        assert_eq!(assess_difficulty(Level::C2, Level::A1), Difficulty::Advanced);
    }

    #[test]
    fn test_learning_tips_by_level() {
        let compound = analyze_compound("Krankenhaus");
        let beginner = learning_tips("Krankenhaus", Level::A1, &compound);
        assert_eq!(
            beginner[1],
            "Look for these word parts: kranken, haus"
        );
        assert!(beginner.iter().any(|t| t.contains("challenging at your level")));

        let intermediate = learning_tips("Krankenhaus", Level::B2, &compound);
        assert!(intermediate.iter().any(|t| t.contains("own compound words")));

        let simple = analyze_compound("Hund");
        let advanced = learning_tips("Hund", Level::C1, &simple);
        assert_eq!(advanced.len(), 2);
        assert!(advanced[0].contains("etymology"));
    }

    #[tokio::test]
    async fn test_analyze_with_definitions() {
        let dictionary =
            FakeDictionary::default().with_entry("Fahrzeug", "Noun", &["<i>vehicle</i>"]);
        let agent = VocabularyBuilder::new(Arc::new(dictionary));

        let outcome = agent.analyze("Fahrzeug", Level::B1).await;

        assert!(outcome.success);
        let analysis = outcome.value().unwrap();
        assert_eq!(analysis.estimated_word_level, Level::B1);
        assert_eq!(analysis.difficulty_assessment, Difficulty::Appropriate);
        assert_eq!(analysis.definitions.len(), 1);
        assert_eq!(analysis.definitions[0].definition, "vehicle");
        assert!(analysis.compound_analysis.is_compound);
    }

    #[test]
    fn test_dictionary_failure_keeps_heuristics() {
        let agent = VocabularyBuilder::new(Arc::new(FakeDictionary::failing()));

        let outcome = tokio_test::block_on(agent.analyze("Zeitschrift", Level::A1));

        assert!(outcome.success);
        let analysis = outcome.value().unwrap();
        assert!(analysis.definitions.is_empty());
        assert_eq!(analysis.difficulty_assessment, Difficulty::Advanced);
    }

    #[tokio::test]
    async fn test_empty_word_fails() {
        let agent = VocabularyBuilder::new(Arc::new(FakeDictionary::default()));
        let outcome = agent.analyze("  ", Level::A1).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("empty word"));
    }
}
