//! Static per-level course material aligned with the Goethe-Institut exams.

use crate::models::Level;

/// What a learner at a level is expected to handle.
#[derive(Debug, Clone, Copy)]
pub struct Syllabus {
    pub can_do: &'static [&'static str],
    pub grammar_focus: &'static [&'static str],
    pub vocabulary_themes: &'static [&'static str],
}

/// Exercise material for the daily lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeMaterial {
    pub grammar_sentence: &'static str,
    pub vocabulary_word: &'static str,
    pub conversation_scenario: &'static str,
}

pub fn syllabus(level: Level) -> Syllabus {
    match level {
        Level::A1 => Syllabus {
            can_do: &[
                "Understand and use familiar everyday expressions",
                "Introduce yourself and others",
                "Ask and answer questions about personal details",
                "Interact in a simple way",
            ],
            grammar_focus: &[
                "Present tense",
                "Basic word order",
                "Nominative and accusative cases",
                "Articles (der/die/das)",
                "Personal pronouns",
                "Possessive articles",
                "Modal verbs (können, müssen, wollen)",
                "Simple questions",
            ],
            vocabulary_themes: &[
                "Personal information",
                "Family",
                "Numbers",
                "Time",
                "Food and drink",
                "Shopping",
                "Hobbies",
                "Daily routine",
            ],
        },
        Level::A2 => Syllabus {
            can_do: &[
                "Understand sentences on familiar topics",
                "Communicate in simple routine tasks",
                "Describe background and environment",
                "Express immediate needs",
            ],
            grammar_focus: &[
                "Perfect tense",
                "Dative case",
                "Prepositions with cases",
                "Comparative and superlative",
                "Subordinate clauses (weil, dass)",
                "Reflexive verbs",
                "Separable verbs",
                "Imperative",
            ],
            vocabulary_themes: &[
                "Housing",
                "Health",
                "Weather",
                "Clothing",
                "Transportation",
                "Media",
                "Education",
                "Work",
            ],
        },
        Level::B1 => Syllabus {
            can_do: &[
                "Understand main points of clear standard input",
                "Deal with most travel situations",
                "Produce simple connected text",
                "Describe experiences, dreams, hopes",
            ],
            grammar_focus: &[
                "All tenses review",
                "Genitive case",
                "Relative clauses",
                "Passive voice",
                "Subjunctive II",
                "Indirect speech",
                "All types of subordinate clauses",
                "Adjective declension",
            ],
            vocabulary_themes: &[
                "Environment",
                "Technology",
                "Politics",
                "Culture",
                "Career and profession",
                "Society",
                "Emotions",
                "Arguments",
            ],
        },
        Level::B2 => Syllabus {
            can_do: &[
                "Understand complex texts on concrete and abstract topics",
                "Interact fluently with native speakers",
                "Produce clear detailed text",
                "Explain viewpoint on topical issues",
            ],
            grammar_focus: &[
                "Advanced subjunctive",
                "Participle constructions",
                "Nominalization",
                "Advanced passive forms",
                "Conjunctive adverbs",
                "Extended attributes",
            ],
            vocabulary_themes: &[
                "Abstract concepts",
                "Idiomatic expressions",
                "Academic language",
                "Business communication",
                "Literary texts",
                "Complex argumentation",
            ],
        },
        Level::C1 => Syllabus {
            can_do: &[
                "Understand wide range of demanding texts",
                "Express ideas fluently and spontaneously",
                "Use language flexibly for social, academic, professional purposes",
                "Produce clear, well-structured detailed text",
            ],
            grammar_focus: &[
                "Fine nuances of all grammar",
                "Stylistic variations",
                "Complex sentence structures",
                "Register switching",
                "Historical grammar forms",
            ],
            vocabulary_themes: &[
                "Specialized fields",
                "Nuanced expression",
                "Academic discourse",
                "Professional specialization",
                "Literary analysis",
                "Cultural criticism",
            ],
        },
        Level::C2 => Syllabus {
            can_do: &[
                "Understand virtually everything heard or read",
                "Summarize information from different sources",
                "Express yourself spontaneously, fluently, precisely",
                "Distinguish finer shades of meaning",
            ],
            grammar_focus: &[
                "Mastery of all grammar",
                "Stylistic refinement",
                "Regional variations",
                "Historical forms",
                "Near-native competence",
            ],
            vocabulary_themes: &[
                "Native-like expression",
                "Subtle distinctions",
                "Field-specific expertise",
                "Cultural references",
                "Literary sophistication",
                "Complete fluency",
            ],
        },
    }
}

pub fn practice_material(level: Level) -> PracticeMaterial {
    match level {
        Level::A1 => PracticeMaterial {
            grammar_sentence: "Das ist mein Haus.",
            vocabulary_word: "Schulbuch",
            conversation_scenario: "Hallo, wie heißt du?",
        },
        Level::A2 => PracticeMaterial {
            grammar_sentence: "Ich habe gestern ein Buch gelesen.",
            vocabulary_word: "Arbeitgeber",
            conversation_scenario: "Können Sie mir helfen?",
        },
        Level::B1 => PracticeMaterial {
            grammar_sentence: "Wenn ich Zeit hätte, würde ich nach Deutschland reisen.",
            vocabulary_word: "Umweltschutz",
            conversation_scenario: "Was denkst du über dieses Thema?",
        },
        Level::B2 => PracticeMaterial {
            grammar_sentence: "Nachdem er die Prüfung bestanden hatte, feierte er mit Freunden.",
            vocabulary_word: "Verantwortungsbewusstsein",
            conversation_scenario: "Könnten wir über die Vor- und Nachteile diskutieren?",
        },
        Level::C1 => PracticeMaterial {
            grammar_sentence: "Trotz der schwierigen Umstände gelang es ihm, sein Ziel zu erreichen.",
            vocabulary_word: "Auseinandersetzung",
            conversation_scenario: "Wie beurteilen Sie die gesellschaftlichen Auswirkungen?",
        },
        Level::C2 => PracticeMaterial {
            grammar_sentence: "Inwieweit die Hypothese zutrifft, bleibt abzuwarten.",
            vocabulary_word: "Unverhältnismäßigkeit",
            conversation_scenario: "Welche Implikationen ergeben sich aus dieser Analyse?",
        },
    }
}

/// Opening lines for a conversation at the given level.
pub fn conversation_starters(level: Level) -> &'static [&'static str] {
    match level {
        Level::A1 => &[
            "Hallo! Wie heißen Sie?",
            "Wie geht es Ihnen?",
            "Wo wohnen Sie?",
            "Was machen Sie gern?",
        ],
        Level::A2 => &[
            "Was haben Sie gestern gemacht?",
            "Können Sie mir den Weg erklären?",
            "Was ist Ihr Lieblingswetter?",
            "Erzählen Sie von Ihrer Familie.",
        ],
        Level::B1 => &[
            "Was denken Sie über das Wetter heute?",
            "Können wir über Ihre Hobbys sprechen?",
            "Wie finden Sie das Leben in Deutschland?",
            "Was würden Sie gern lernen?",
        ],
        Level::B2 => &[
            "Wie stehen Sie zu aktuellen Ereignissen?",
            "Was würden Sie in dieser Situation machen?",
            "Können Sie Ihre Meinung dazu äußern?",
            "Lassen Sie uns über Kultur diskutieren.",
        ],
        Level::C1 => &[
            "Wie beurteilen Sie die gesellschaftlichen Entwicklungen?",
            "Könnten Sie Ihren Standpunkt differenziert erläutern?",
            "Was sind die Vor- und Nachteile dieser Lösung?",
            "Wie würden Sie dieses komplexe Problem angehen?",
        ],
        Level::C2 => &[
            "Inwieweit stimmen Sie der Hypothese zu?",
            "Welche Implikationen ergeben sich daraus?",
            "Wie würden Sie die Nuancen dieser Argumentation bewerten?",
            "Können Sie eine kritische Analyse vornehmen?",
        ],
    }
}
