//! Markdown and JSON rendering.
//!
//! Every renderer returns a `String`; the caller decides whether it goes
//! to stdout or to a file via [`write_report`].

use crate::agent::grammar::{article_table, case_explanation, ArticleTable};
use crate::curriculum::Syllabus;
use crate::error::TutorResult;
use crate::models::{ConversationResponse, GrammarAnalysis, Lesson, Level, VocabularyAnalysis};
use crate::progress::{DailyLesson, UserProgress};
use crate::progress::daily::Exercise;
use crate::speech::{AudioStats, Voice};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Render a lesson, with the full grammar breakdown when available.
pub fn generate_lesson_markdown(lesson: &Lesson, grammar: Option<&GrammarAnalysis>) -> String {
    let mut output = String::new();

    output.push_str("# 🇩🇪 German Lesson\n\n");
    output.push_str(&generate_lesson_metadata(lesson));

    if let Some(grammar) = grammar {
        output.push_str(&generate_grammar_section(grammar));
    } else if let Some(ref insights) = lesson.grammar_insights {
        output.push_str("## Grammar\n\n");
        push_paragraph(&mut output, "Structures", &insights.main_structures);
        push_paragraph(&mut output, "Tip", &insights.learning_tip);
        push_list(&mut output, "Common mistakes", &insights.common_mistakes);
    }

    if !lesson.vocabulary_insights.is_empty() {
        output.push_str("## Vocabulary\n\n");
        output.push_str("| Word | Level | Compound | Difficulty |\n");
        output.push_str("|:---|:---:|:---:|:---|\n");
        for v in &lesson.vocabulary_insights {
            output.push_str(&format!(
                "| {} | {} | {} | {} {} |\n",
                v.word,
                v.level,
                if v.is_compound { "yes" } else { "no" },
                v.difficulty.emoji(),
                v.difficulty
            ));
        }
        output.push('\n');
    }

    if let Some(ref practice) = lesson.conversation_practice {
        output.push_str("## Conversation Practice\n\n");
        output.push_str(&format!("> {}\n\n", practice.suggested_response));
        if !practice.translation.is_empty() {
            output.push_str(&format!("*{}*\n\n", practice.translation));
        }
        push_paragraph(&mut output, "Cultural note", &practice.cultural_note);
        push_list(&mut output, "Tips", &practice.conversation_tips);
    }

    if !lesson.learning_plan.is_empty() {
        output.push_str("## Learning Plan\n\n");
        for (i, step) in lesson.learning_plan.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, step));
        }
        output.push('\n');
    }

    output.push_str(&generate_footer());
    output
}

fn generate_lesson_metadata(lesson: &Lesson) -> String {
    let mut section = String::new();

    section.push_str(&format!("> {}\n\n", lesson.original_input));
    section.push_str(&format!(
        "- **Level:** {} ({})\n",
        lesson.user_level,
        lesson.user_level.label()
    ));
    section.push_str(&format!("- **Goal:** {}\n", lesson.learning_goal));
    if let Some(ref topic) = lesson.topic {
        section.push_str(&format!("- **Topic:** {}\n", topic));
    }
    section.push_str(&format!(
        "- **Difficulty:** {} {}\n",
        lesson.difficulty_assessment.emoji(),
        lesson.difficulty_assessment
    ));
    section.push_str(&format!(
        "- **Study time:** {}\n",
        lesson.estimated_study_time
    ));
    section.push_str(&format!(
        "- **Created:** {}\n\n",
        lesson.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    section
}

fn generate_grammar_section(grammar: &GrammarAnalysis) -> String {
    let mut section = String::new();
    section.push_str("## Grammar\n\n");

    if let Some(ref raw) = grammar.raw_response {
        section.push_str(raw.trim());
        section.push_str("\n\n");
        return section;
    }

    if !grammar.articles.is_empty() {
        section.push_str("### Articles\n\n");
        for a in &grammar.articles {
            section.push_str(&format!(
                "- **{}** ({}, {}, {}): {}\n",
                a.word, a.kind, a.gender, a.case, a.explanation
            ));
        }
        section.push('\n');
    }

    if !grammar.nouns.is_empty() {
        section.push_str("### Nouns\n\n");
        for n in &grammar.nouns {
            let plural = if n.plural.is_empty() {
                String::new()
            } else {
                format!(", plural *{}*", n.plural)
            };
            section.push_str(&format!(
                "- **{}** ({}, {}{}): {}\n",
                n.word, n.gender, n.case, plural, n.explanation
            ));
        }
        section.push('\n');
    }

    if !grammar.verbs.is_empty() {
        section.push_str("### Verbs\n\n");
        for v in &grammar.verbs {
            section.push_str(&format!(
                "- **{}** from *{}* ({}, {}): {}\n",
                v.word, v.infinitive, v.tense, v.person, v.explanation
            ));
        }
        section.push('\n');
    }

    if !grammar.adjectives.is_empty() {
        section.push_str("### Adjectives\n\n");
        for a in &grammar.adjectives {
            section.push_str(&format!(
                "- **{}** ({}): {}\n",
                a.word, a.declension, a.explanation
            ));
        }
        section.push('\n');
    }

    push_paragraph(&mut section, "Cases", &grammar.cases_explanation);
    push_paragraph(&mut section, "Tip", &grammar.level_appropriate_tip);
    push_list(&mut section, "Common mistakes", &grammar.common_mistakes);

    section
}

pub fn generate_vocabulary_markdown(analysis: &VocabularyAnalysis) -> String {
    let mut output = String::new();

    output.push_str(&format!("# 📖 {}\n\n", analysis.word));
    output.push_str(&format!(
        "- **Estimated level:** {}\n",
        analysis.estimated_word_level
    ));
    output.push_str(&format!(
        "- **For you ({}):** {} {}\n",
        analysis.learner_level,
        analysis.difficulty_assessment.emoji(),
        analysis.difficulty_assessment
    ));
    output.push_str(&format!(
        "- **Structure:** {} ({} characters)\n\n",
        analysis.compound_analysis.complexity, analysis.compound_analysis.word_length
    ));

    if !analysis.compound_analysis.estimated_components.is_empty() {
        output.push_str("## Word Parts\n\n");
        for part in &analysis.compound_analysis.estimated_components {
            output.push_str(&format!("- `{}`: {}\n", part.part, part.meaning));
        }
        output.push('\n');
    }

    output.push_str("## Definitions\n\n");
    if analysis.definitions.is_empty() {
        output.push_str("No dictionary entry found.\n\n");
    } else {
        for d in &analysis.definitions {
            output.push_str(&format!("- *{}*: {}\n", d.part_of_speech, d.definition));
        }
        output.push('\n');
    }

    push_list(&mut output, "Learning tips", &analysis.learning_tips);
    output
}

pub fn generate_conversation_markdown(response: &ConversationResponse) -> String {
    let mut output = String::new();

    output.push_str("# 💬 Conversation\n\n");
    output.push_str(&format!("**You:** {}\n\n", response.user_input));
    output.push_str(&format!("**Partner:** {}\n\n", response.german_response));
    if !response.english_translation.is_empty() {
        output.push_str(&format!("*{}*\n\n", response.english_translation));
    }

    if !response.corrections.is_empty() {
        output.push_str("## Corrections\n\n");
        for c in &response.corrections {
            output.push_str(&format!(
                "- ~~{}~~ → **{}**: {}\n",
                c.error, c.correction, c.explanation
            ));
        }
        output.push('\n');
    }

    if !response.vocabulary_help.is_empty() {
        output.push_str("## Vocabulary Help\n\n");
        for v in &response.vocabulary_help {
            output.push_str(&format!("- **{}** ({}): {}\n", v.word, v.level, v.meaning));
        }
        output.push('\n');
    }

    push_paragraph(&mut output, "Cultural note", &response.cultural_note);
    push_list(&mut output, "Tips", &response.conversation_tips);
    push_list(&mut output, "You could answer", &response.suggested_responses);

    if let Some(ref note) = response.note {
        output.push_str(&format!("_{}_\n", note));
    }

    output
}

pub fn generate_daily_lesson_markdown(lesson: &DailyLesson) -> String {
    let mut output = String::new();

    output.push_str(&format!("# 📅 Daily Lesson #{}\n\n", lesson.lesson_number));
    output.push_str(&format!(
        "- **Level:** {} → {}\n",
        lesson.user_level, lesson.target_level
    ));
    output.push_str(&format!("- **Duration:** {}\n", lesson.estimated_duration));
    let focus: Vec<String> = lesson.focus_areas.iter().map(|f| f.to_string()).collect();
    output.push_str(&format!("- **Focus:** {}\n\n", focus.join(", ")));

    output.push_str(&format!("{}\n\n", lesson.motivation_message));

    let content = &lesson.content;
    output.push_str("## Warm-up\n\n");
    if content.warm_up.words.is_empty() {
        output.push_str("No words learned yet. Today is a good day to start!\n\n");
    } else {
        output.push_str(&format!("{}:\n\n", content.warm_up.instruction));
        for word in &content.warm_up.words {
            output.push_str(&format!("- {}\n", word));
        }
        output.push('\n');
    }

    push_exercises(&mut output, "Exercises", &content.main_exercises);
    push_exercises(&mut output, "Conversation", &content.practice_conversations);
    push_list(&mut output, "Reflection", &content.reflection_questions);

    output.push_str("## Goals\n\n");
    output.push_str(&format!(
        "- {} minutes, {} exercises, {} new words\n\n",
        lesson.daily_goals.target_minutes,
        lesson.daily_goals.target_exercises,
        lesson.daily_goals.target_new_words
    ));

    output.push_str(&format!(
        "**Streak:** {} · **Words:** {} · **Grammar patterns:** {} · **Completion:** {:.0}%\n",
        lesson.stats.current_streak,
        lesson.stats.words_learned,
        lesson.stats.grammar_patterns,
        lesson.stats.completion_rate * 100.0
    ));

    output
}

fn push_exercises(output: &mut String, title: &str, exercises: &[Exercise]) {
    if exercises.is_empty() {
        return;
    }
    output.push_str(&format!("## {}\n\n", title));
    for (i, e) in exercises.iter().enumerate() {
        output.push_str(&format!("{}. **{}**\n   > {}\n", i + 1, e.focus, e.material));
    }
    output.push('\n');
}

pub fn generate_progress_markdown(progress: &UserProgress) -> String {
    let mut output = String::new();

    output.push_str(&format!("# 📈 Progress for {}\n\n", progress.user_id));
    output.push_str("| Level | Target | Streak | Sessions | Words | Grammar |\n");
    output.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    output.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n\n",
        progress.current_level,
        progress.target_level,
        progress.learning_streak,
        progress.total_sessions,
        progress.vocabulary_learned.len(),
        progress.grammar_patterns_mastered.len()
    ));

    if let Some(last) = progress.last_lesson_date {
        output.push_str(&format!(
            "Last lesson: {}\n\n",
            last.format("%Y-%m-%d %H:%M UTC")
        ));
    }

    let recent: Vec<String> = progress
        .recent_words(10)
        .into_iter()
        .map(String::from)
        .collect();
    push_list(&mut output, "Recent words", &recent);
    push_list(
        &mut output,
        "Topics practiced",
        &progress.conversation_topics_practiced,
    );

    let weak = &progress.weak_areas;
    if !weak.is_empty() {
        output.push_str("## Areas to Work On\n\n");
        for (area, notes) in [
            ("Grammar", &weak.grammar),
            ("Vocabulary", &weak.vocabulary),
            ("Conversation", &weak.conversation),
        ] {
            for note in notes {
                output.push_str(&format!("- **{}:** {}\n", area, note));
            }
        }
        output.push('\n');
    }

    output
}

pub fn generate_syllabus_markdown(level: Level, syllabus: &Syllabus) -> String {
    let mut output = format!("# Goethe {} ({})\n\n", level, level.label());
    for (title, items) in [
        ("Can do", syllabus.can_do),
        ("Grammar focus", syllabus.grammar_focus),
        ("Vocabulary themes", syllabus.vocabulary_themes),
    ] {
        output.push_str(&format!("## {}\n\n", title));
        for item in items {
            output.push_str(&format!("- {}\n", item));
        }
        output.push('\n');
    }
    output
}

/// Definite-article declension for one gender, or all of them.
pub fn generate_articles_markdown(genders: &[&str]) -> String {
    let mut output = String::from("# Definite Articles\n\n");
    output.push_str("| Gender | Nominativ | Akkusativ | Dativ | Genitiv |\n");
    output.push_str("|:---|:---:|:---:|:---:|:---:|\n");

    for gender in genders {
        if let Some(ArticleTable {
            nominativ,
            akkusativ,
            dativ,
            genitiv,
        }) = article_table(gender)
        {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                gender, nominativ, akkusativ, dativ, genitiv
            ));
        }
    }

    output.push_str("\n## Cases\n\n");
    for case in ["Nominativ", "Akkusativ", "Dativ", "Genitiv"] {
        output.push_str(&format!("- **{}:** {}\n", case, case_explanation(case)));
    }
    output
}

pub fn generate_voices_markdown(voices: &[Voice], default_voice: &str) -> String {
    let mut output = String::from("# German Voices\n\n");
    for v in voices {
        let marker = if v.voice == default_voice { " (default)" } else { "" };
        output.push_str(&format!(
            "- `{}`{}: {} from {}. {}\n",
            v.voice, marker, v.description, v.region, v.style
        ));
    }
    output
}

pub fn generate_audio_stats_markdown(stats: &AudioStats, dir: &Path) -> String {
    format!(
        "# Audio Cache\n\n- **Directory:** {}\n- **Files:** {}\n- **Size:** {:.1} KB ({:.2} MB)\n",
        dir.display(),
        stats.file_count,
        stats.total_size_kb,
        stats.total_size_mb
    )
}

fn push_paragraph(output: &mut String, title: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    output.push_str(&format!("**{}:** {}\n\n", title, text.trim()));
}

fn push_list(output: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    output.push_str(&format!("**{}:**\n\n", title));
    for item in items {
        output.push_str(&format!("- {}\n", item));
    }
    output.push('\n');
}

fn generate_footer() -> String {
    "---\n\n*Viel Erfolg beim Lernen! Generated by lehrer.*\n".to_string()
}

/// Pretty JSON for any renderable value.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> TutorResult<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write rendered output to `path`, creating parent directories.
pub fn write_report(content: &str, path: &Path) -> TutorResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::syllabus;
    use crate::models::{
        ConversationPractice, Correction, Difficulty, GrammarInsights, NounNote, VocabularyInsight,
    };
    use crate::progress::daily_lesson;
    use crate::speech::available_voices;
    use chrono::Utc;

    fn create_test_lesson() -> Lesson {
        Lesson {
            original_input: "Ich möchte ein Fahrzeug kaufen.".to_string(),
            user_level: Level::B1,
            learning_goal: "conversation practice".to_string(),
            topic: Some("shopping".to_string()),
            created_at: Utc::now(),
            grammar_insights: Some(GrammarInsights {
                main_structures: "Modal verb plus infinitive".to_string(),
                learning_tip: "The infinitive goes to the end.".to_string(),
                common_mistakes: vec!["Ich möchte kaufen ein Fahrzeug".to_string()],
            }),
            vocabulary_insights: vec![VocabularyInsight {
                word: "Fahrzeug".to_string(),
                level: Level::B1,
                is_compound: true,
                difficulty: Difficulty::Appropriate,
            }],
            conversation_practice: Some(ConversationPractice {
                suggested_response: "Welches Fahrzeug möchtest du?".to_string(),
                translation: "Which vehicle do you want?".to_string(),
                cultural_note: String::new(),
                conversation_tips: vec!["Ask about the price".to_string()],
            }),
            learning_plan: vec!["Practice breaking down compound words: Fahrzeug".to_string()],
            difficulty_assessment: Difficulty::Appropriate,
            estimated_study_time: "10-15 minutes".to_string(),
        }
    }

    #[test]
    fn test_generate_lesson_markdown() {
        let lesson = create_test_lesson();
        let markdown = generate_lesson_markdown(&lesson, None);

        assert!(markdown.contains("# 🇩🇪 German Lesson"));
        assert!(markdown.contains("- **Topic:** shopping"));
        assert!(markdown.contains("**Tip:** The infinitive goes to the end."));
        assert!(markdown.contains("| Fahrzeug | B1 | yes | 🟢 appropriate |"));
        assert!(markdown.contains("> Welches Fahrzeug möchtest du?"));
        assert!(markdown.contains("1. Practice breaking down compound words: Fahrzeug"));
        // Empty cultural note is skipped.
        assert!(!markdown.contains("Cultural note"));
    }

    #[test]
    fn test_lesson_markdown_prefers_full_grammar() {
        let lesson = create_test_lesson();
        let grammar = GrammarAnalysis {
            nouns: vec![NounNote {
                word: "Fahrzeug".to_string(),
                gender: "neuter".to_string(),
                case: "akkusativ".to_string(),
                plural: "Fahrzeuge".to_string(),
                explanation: "Direct object".to_string(),
            }],
            ..Default::default()
        };

        let markdown = generate_lesson_markdown(&lesson, Some(&grammar));
        assert!(markdown.contains("### Nouns"));
        assert!(markdown.contains("- **Fahrzeug** (neuter, akkusativ, plural *Fahrzeuge*): Direct object"));

        let raw = GrammarAnalysis {
            raw_response: Some("Plain explanation".to_string()),
            ..Default::default()
        };
        let markdown = generate_lesson_markdown(&lesson, Some(&raw));
        assert!(markdown.contains("## Grammar\n\nPlain explanation"));
    }

    #[test]
    fn test_generate_conversation_markdown() {
        let response = ConversationResponse {
            german_response: "Mir geht es gut!".to_string(),
            user_input: "Wie geht es dir".to_string(),
            corrections: vec![Correction {
                error: "Wie geht es dir".to_string(),
                correction: "Wie geht es dir?".to_string(),
                explanation: "Questions end with a question mark".to_string(),
            }],
            ..Default::default()
        };

        let markdown = generate_conversation_markdown(&response);
        assert!(markdown.contains("**Partner:** Mir geht es gut!"));
        assert!(markdown.contains("## Corrections"));
        assert!(!markdown.contains("Vocabulary Help"));
    }

    #[test]
    fn test_generate_daily_and_progress_markdown() {
        let mut progress = UserProgress::new("anna", Level::B2, Utc::now());
        progress.total_sessions = 1;
        progress.learning_streak = 1;
        progress.weak_areas.grammar.push("Practice avoiding the common grammar mistakes highlighted".to_string());

        let daily = generate_daily_lesson_markdown(&daily_lesson(&progress, Utc::now()));
        assert!(daily.contains("# 📅 Daily Lesson #2"));
        assert!(daily.contains("- **Focus:** grammar"));
        assert!(daily.contains("> Das ist mein Haus."));
        assert!(daily.contains("No words learned yet"));

        let report = generate_progress_markdown(&progress);
        assert!(report.contains("# 📈 Progress for anna"));
        assert!(report.contains("| A1 | B2 | 1 | 1 | 0 | 0 |"));
        assert!(report.contains("- **Grammar:** Practice avoiding"));
    }

    #[test]
    fn test_reference_tables() {
        let articles = generate_articles_markdown(&["masculine", "bogus"]);
        assert!(articles.contains("| masculine | der | den | dem | des |"));
        assert!(!articles.contains("bogus"));
        assert!(articles.contains("- **Dativ:** The indirect object"));

        let s = generate_syllabus_markdown(Level::A1, &syllabus(Level::A1));
        assert!(s.contains("# Goethe A1 (Beginner)"));
        assert!(s.contains("- Present tense"));

        let voices = generate_voices_markdown(available_voices(), "de-DE-KatjaNeural");
        assert!(voices.contains("`de-DE-KatjaNeural` (default)"));
        assert!(!voices.contains("`de-CH-JanNeural` (default)"));
    }

    #[test]
    fn test_generate_json_and_write() {
        let lesson = create_test_lesson();
        let json = generate_json(&lesson).unwrap();
        assert!(json.contains("\"vocabulary_insights\""));
        assert!(json.contains("\"difficulty_assessment\": \"appropriate\""));

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/lesson.json");
        write_report(&json, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), json);
    }
}
