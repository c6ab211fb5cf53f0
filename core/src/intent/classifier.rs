//! Intent classification — step 1 of the Intent Engine pipeline.
//!
//! Tries a generative classification call first, pre-seeded with the
//! lexicon's keyword hints. If the gateway call itself fails (every provider
//! exhausted), `classify` never propagates the error: it returns the
//! deterministic keyword-only guess tagged with `intent: Fallback`, so the
//! dispatcher can still route the message using the same lexicon rules that
//! would have hinted the AI call (§4.4's "fallback" pipeline).

use crate::gateway::ProviderGateway;
use crate::schema::canvas::CanvasSection;
use crate::schema::intent::{Intent, IntentClassification};
use crate::schema::issue::safe_parse_value;
use crate::schema::requests::ChatMessage;

use super::lexicon;
use super::prompts;

/// The result of attempting classification: the classification itself (which
/// is the literal `Fallback` variant if the AI call failed), plus — only in
/// that case — the deterministic guess the dispatcher should route on.
pub struct ClassifyOutcome {
    pub classification: IntentClassification,
    pub fallback_guess: Option<IntentClassification>,
}

/// Deterministic, non-AI classification built purely from the bilingual
/// keyword lexicon. Used both to pre-seed hints for the generative call and
/// as the emergency routing decision when that call fails outright.
pub fn keyword_only_classification(message: &str) -> IntentClassification {
    let target_sections: Vec<CanvasSection> = lexicon::match_sections(message)
        .into_iter()
        .filter(|(_, c)| *c >= 0.4)
        .map(|(s, _)| s)
        .collect();
    let keywords = lexicon::matched_phrases(message);

    let intent = if lexicon::is_off_topic_dominant(message) {
        Intent::OffTopic
    } else if lexicon::has_unanchored_pronoun_reference(message) {
        Intent::AskClarification
    } else if lexicon::has_modify_keyword(message) {
        Intent::ModifyCanvas
    } else if lexicon::has_informational_keyword(message) {
        Intent::ProvideInformation
    } else {
        Intent::AskClarification
    };

    IntentClassification {
        intent,
        confidence: 0.5,
        target_sections,
        keywords,
        reasoning: "keyword-lexicon classification (no generative call)".to_string(),
        should_modify_canvas: intent == Intent::ModifyCanvas,
        requires_clarification: intent == Intent::AskClarification,
    }
}

/// Apply §4.4's decisiveness rule to a generatively-produced classification:
/// low confidence biases toward `ask_clarification`, unless off-topic
/// keywords dominate the message, in which case `off_topic` wins instead.
fn apply_decisiveness_rule(mut classification: IntentClassification, message: &str) -> IntentClassification {
    if classification.confidence < 0.5 {
        classification.intent = if lexicon::is_off_topic_dominant(message) {
            Intent::OffTopic
        } else {
            Intent::AskClarification
        };
        classification.requires_clarification = classification.intent == Intent::AskClarification;
        classification.should_modify_canvas = false;
    }
    classification
}

/// Run the classifier. Never returns `Err` — a gateway failure degrades to
/// the keyword-only fallback path instead of propagating.
pub async fn classify(
    gateway: &ProviderGateway,
    message: &str,
    history: &[ChatMessage],
) -> ClassifyOutcome {
    let hints = lexicon::matched_phrases(message);
    let (system, user) = prompts::classification_prompt(message, history, &hints);

    match gateway.generate_object(&system, &user).await {
        Ok(value) => match safe_parse_value::<IntentClassification>(value) {
            Ok(classification) => ClassifyOutcome {
                classification: apply_decisiveness_rule(classification, message),
                fallback_guess: None,
            },
            Err(_) => {
                let guess = keyword_only_classification(message);
                ClassifyOutcome {
                    classification: IntentClassification {
                        intent: Intent::Fallback,
                        confidence: 0.0,
                        target_sections: Vec::new(),
                        keywords: Vec::new(),
                        reasoning: "model response failed schema validation".to_string(),
                        should_modify_canvas: false,
                        requires_clarification: false,
                    },
                    fallback_guess: Some(guess),
                }
            }
        },
        Err(_) => {
            let guess = keyword_only_classification(message);
            ClassifyOutcome {
                classification: IntentClassification {
                    intent: Intent::Fallback,
                    confidence: 0.0,
                    target_sections: Vec::new(),
                    keywords: Vec::new(),
                    reasoning: "all providers were exhausted during classification".to_string(),
                    should_modify_canvas: false,
                    requires_clarification: false,
                },
                fallback_guess: Some(guess),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_topic_message_classifies_off_topic() {
        let c = keyword_only_classification("What's the weather like today?");
        assert_eq!(c.intent, Intent::OffTopic);
    }

    #[test]
    fn unanchored_pronoun_classifies_as_clarification() {
        let c = keyword_only_classification("This is wrong, fix it");
        assert_eq!(c.intent, Intent::AskClarification);
        assert!(c.requires_clarification);
    }

    #[test]
    fn modify_keyword_with_section_classifies_modify() {
        let c = keyword_only_classification("Tighten the acceptance criteria");
        assert_eq!(c.intent, Intent::ModifyCanvas);
        assert!(c.target_sections.contains(&CanvasSection::AcceptanceCriteria));
    }

    #[test]
    fn informational_question_classifies_provide_information() {
        let c = keyword_only_classification("What does the test_cases section cover?");
        assert_eq!(c.intent, Intent::ProvideInformation);
    }

    #[test]
    fn decisiveness_rule_overrides_low_confidence_to_clarification() {
        let low = IntentClassification {
            intent: Intent::ModifyCanvas,
            confidence: 0.2,
            target_sections: Vec::new(),
            keywords: Vec::new(),
            reasoning: "uncertain".to_string(),
            should_modify_canvas: true,
            requires_clarification: false,
        };
        let adjusted = apply_decisiveness_rule(low, "do the thing");
        assert_eq!(adjusted.intent, Intent::AskClarification);
    }

    #[test]
    fn decisiveness_rule_prefers_off_topic_when_keywords_dominate() {
        let low = IntentClassification {
            intent: Intent::ModifyCanvas,
            confidence: 0.1,
            target_sections: Vec::new(),
            keywords: Vec::new(),
            reasoning: "uncertain".to_string(),
            should_modify_canvas: true,
            requires_clarification: false,
        };
        let adjusted = apply_decisiveness_rule(low, "tell me a joke about the weather");
        assert_eq!(adjusted.intent, Intent::OffTopic);
    }

    #[test]
    fn high_confidence_classification_is_untouched() {
        let high = IntentClassification {
            intent: Intent::ModifyCanvas,
            confidence: 0.9,
            target_sections: vec![CanvasSection::TestCases],
            keywords: Vec::new(),
            reasoning: "clear".to_string(),
            should_modify_canvas: true,
            requires_clarification: false,
        };
        let adjusted = apply_decisiveness_rule(high, "add a test case");
        assert_eq!(adjusted.intent, Intent::ModifyCanvas);
    }
}
