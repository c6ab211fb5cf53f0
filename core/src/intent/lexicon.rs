//! Bilingual (Spanish + English) keyword lexicon that pre-seeds intent and
//! target-section hints before (and, on gateway failure, instead of) the
//! generative classification call.
//!
//! Grounded on the teacher's [`crate::router`]-equivalent keyword-driven
//! `ModelRouter::classify_task` (`task_classifier.rs`): a closed keyword list
//! per category, matched by case-insensitive substring, no tokenizer.

use crate::schema::canvas::CanvasSection;

/// Phrases that, found in a message, suggest the user is off-topic for a QA
/// documentation assistant.
pub const OFF_TOPIC_KEYWORDS: &[&str] = &[
    "weather", "clima", "joke", "chiste", "sports", "deportes", "recipe", "receta", "movie",
    "película", "music", "música", "news", "noticias", "football", "fútbol", "stock price",
    "horoscope", "horóscopo",
];

/// Phrases that suggest the user wants the canvas changed.
pub const MODIFY_KEYWORDS: &[&str] = &[
    "add", "agregar", "añadir", "change", "cambiar", "update", "actualizar", "remove", "eliminar",
    "quitar", "modify", "modificar", "fix", "corregir", "arreglar", "tighten", "rewrite",
    "reescribir", "improve", "mejorar", "delete", "borrar",
];

/// Phrases that suggest the user is asking a question rather than a change.
pub const INFORMATIONAL_KEYWORDS: &[&str] = &[
    "what", "qué", "how", "cómo", "why", "por qué", "explain", "explica", "explicar", "describe",
    "describir", "tell me", "dime", "is there", "hay",
];

/// Context-free pronoun references that, absent a clear antecedent, are an
/// ambiguity signal per §4.4's decisiveness rule.
pub const AMBIGUOUS_PRONOUNS: &[&str] = &["it", "this", "that", "esto", "eso", "esta", "ese"];

/// Spanish function words used to guess the message's language for
/// language-matched off-topic rejection templates.
const SPANISH_MARKERS: &[&str] = &[
    "qué", "cómo", "por qué", "está", "esto", "eso", "añadir", "agregar", "cambiar", "el ", "la ",
    "los ", "las ", "por favor",
];

/// Bilingual phrase → canvas section mapping, ordered most-specific-first so
/// [`match_sections`] can assign the higher confidence to a direct mention.
const SECTION_PHRASES: &[(CanvasSection, &[&str], f64)] = &[
    (
        CanvasSection::AcceptanceCriteria,
        &[
            "acceptance criteria",
            "criterios de aceptación",
            "acceptance criterion",
        ],
        0.9,
    ),
    (
        CanvasSection::AcceptanceCriteria,
        &["criteria", "criterios", "requirement", "requisito"],
        0.55,
    ),
    (
        CanvasSection::TestCases,
        &["test case", "casos de prueba", "test cases", "scenario", "escenario"],
        0.9,
    ),
    (
        CanvasSection::TestCases,
        &["test", "prueba", "tests", "pruebas"],
        0.5,
    ),
    (
        CanvasSection::TicketSummary,
        &["summary", "resumen", "problem statement", "ticket summary"],
        0.85,
    ),
    (
        CanvasSection::ConfigurationWarnings,
        &["warning", "advertencia", "configuration warning"],
        0.8,
    ),
    (
        CanvasSection::Metadata,
        &["metadata", "metadatos", "version", "versión"],
        0.6,
    ),
];

/// Case-insensitive substring match against [`OFF_TOPIC_KEYWORDS`].
pub fn is_off_topic_dominant(message: &str) -> bool {
    let lower = message.to_lowercase();
    OFF_TOPIC_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub fn has_modify_keyword(message: &str) -> bool {
    let lower = message.to_lowercase();
    MODIFY_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub fn has_informational_keyword(message: &str) -> bool {
    let lower = message.to_lowercase();
    INFORMATIONAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// An ambiguous pronoun used without any canvas-section noun alongside it —
/// "fix it", "change that" — is the clearest textual sign a message needs
/// clarification rather than blind action.
pub fn has_unanchored_pronoun_reference(message: &str) -> bool {
    let lower = message.to_lowercase();
    let has_pronoun = AMBIGUOUS_PRONOUNS
        .iter()
        .any(|p| lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *p));
    has_pronoun && match_sections(message).is_empty()
}

pub fn guess_is_spanish(message: &str) -> bool {
    let lower = message.to_lowercase();
    SPANISH_MARKERS.iter().any(|m| lower.contains(m))
}

/// Every matched (section, confidence) pair, deduplicated by keeping the
/// highest confidence seen for a given section.
pub fn match_sections(message: &str) -> Vec<(CanvasSection, f64)> {
    let lower = message.to_lowercase();
    let mut best: Vec<(CanvasSection, f64)> = Vec::new();

    for (section, phrases, confidence) in SECTION_PHRASES {
        if phrases.iter().any(|p| lower.contains(p)) {
            match best.iter_mut().find(|(s, _)| s == section) {
                Some((_, existing)) if *existing < *confidence => *existing = *confidence,
                Some(_) => {}
                None => best.push((*section, *confidence)),
            }
        }
    }

    best
}

/// Every phrase from [`SECTION_PHRASES`] found verbatim in `message`,
/// deduplicated, in scan order — used to populate `keywords` on both the
/// classifier's and the target detector's output.
pub fn matched_phrases(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut found = Vec::new();
    for (_, phrases, _) in SECTION_PHRASES {
        for phrase in *phrases {
            if lower.contains(phrase) && !found.contains(&phrase.to_string()) {
                found.push(phrase.to_string());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_topic_keyword_detected() {
        assert!(is_off_topic_dominant("What's the weather like today?"));
        assert!(!is_off_topic_dominant("Tighten the acceptance criteria"));
    }

    #[test]
    fn modify_keyword_detected_bilingually() {
        assert!(has_modify_keyword("please add a test case"));
        assert!(has_modify_keyword("por favor agregar un caso"));
    }

    #[test]
    fn section_phrases_prefer_more_specific_match() {
        let matches = match_sections("please update the acceptance criteria for login");
        let (_, confidence) = matches
            .iter()
            .find(|(s, _)| *s == CanvasSection::AcceptanceCriteria)
            .unwrap();
        assert!(*confidence >= 0.7);
    }

    #[test]
    fn unanchored_pronoun_without_section_is_ambiguous() {
        assert!(has_unanchored_pronoun_reference("this is wrong, fix it"));
        assert!(!has_unanchored_pronoun_reference("fix the test cases"));
    }

    #[test]
    fn spanish_markers_detected() {
        assert!(guess_is_spanish("¿Cómo está el resumen?"));
        assert!(!guess_is_spanish("How is the summary?"));
    }
}
