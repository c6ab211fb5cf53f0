//! Explicit prompt templates for the Intent Engine's two generative calls
//! (classification, secondary target detection) plus the clarification and
//! contextual-response generators. Pure functions, no runtime composition —
//! per §9's "dynamically constructed prompts" redesign note.

use crate::schema::canvas::QACanvasDocument;
use crate::schema::requests::ChatMessage;

fn history_block(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "(no prior conversation)".to_string();
    }
    history
        .iter()
        .rev()
        .take(6)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn classification_prompt(
    message: &str,
    history: &[ChatMessage],
    keyword_hints: &[String],
) -> (String, String) {
    let system = "You are the intent classifier for a QA documentation assistant. Classify the \
        user's message into exactly one of: modify_canvas, provide_information, \
        ask_clarification, off_topic. Respond with a single JSON object: {\"intent\": string, \
        \"confidence\": number between 0 and 1, \"target_sections\": array of strings from \
        [\"ticket_summary\",\"acceptance_criteria\",\"test_cases\",\"configuration_warnings\",\
        \"metadata\"], \"keywords\": array of strings, \"reasoning\": string, \
        \"should_modify_canvas\": bool, \"requires_clarification\": bool}. Output only the JSON \
        object, no prose, no code fences."
        .to_string();

    let hints = if keyword_hints.is_empty() {
        "(none)".to_string()
    } else {
        keyword_hints.join(", ")
    };

    let user = format!(
        "Conversation so far:\n{}\n\nLatest user message: {message:?}\n\nKeyword hints detected \
         by a lexicon pre-pass (advisory only, may be wrong): {hints}\n\nClassify this message.",
        history_block(history),
    );
    (system, user)
}

pub fn target_detection_prompt(message: &str, canvas: Option<&QACanvasDocument>) -> (String, String) {
    let system = "You identify which sections of a QA canvas a user's message is asking to \
        change. Respond with a single JSON object: {\"targets\": array of {\"section\": string \
        from [\"ticket_summary\",\"acceptance_criteria\",\"test_cases\",\
        \"configuration_warnings\",\"metadata\"], \"confidence\": number between 0 and 1}, \
        \"keywords\": array of strings}. Output only the JSON object, no prose, no code fences."
        .to_string();

    let canvas_hint = match canvas {
        Some(doc) => format!(
            "Current canvas has {} acceptance criteria and {} test cases.",
            doc.acceptance_criteria.len(),
            doc.test_cases.len()
        ),
        None => "No canvas is loaded yet.".to_string(),
    };

    let user = format!("{canvas_hint}\n\nUser message: {message:?}\n\nIdentify target sections.");
    (system, user)
}

pub fn clarification_prompt(message: &str, target_sections: &[String]) -> (String, String) {
    let system = "You write clarifying questions for an ambiguous QA-documentation change \
        request. Respond with a JSON array (1 to 4 items) of objects: {\"question\": string, \
        \"category\": string, \"target_section\": string or null (one of \
        \"ticket_summary\",\"acceptance_criteria\",\"test_cases\",\"configuration_warnings\",\
        \"metadata\"), \"priority\": \"high\"|\"medium\"|\"low\"}. Output only the JSON array, \
        no prose, no code fences."
        .to_string();
    let user = format!(
        "User message: {message:?}\nLikely target sections: {}\n\nWrite clarifying questions.",
        if target_sections.is_empty() {
            "(none identified)".to_string()
        } else {
            target_sections.join(", ")
        }
    );
    (system, user)
}

pub fn contextual_response_prompt(message: &str, canvas: &QACanvasDocument) -> (String, String) {
    let system = "You answer questions about an existing QA canvas document, citing which \
        sections you drew from. Respond with a single JSON object: {\"response\": string, \
        \"citations\": array of strings (canvas section names you used), \
        \"suggested_follow_ups\": array of strings (0 to 3 follow-up questions the user might \
        ask next)}. Output only the JSON object, no prose, no code fences."
        .to_string();
    let user = format!(
        "Canvas problem statement: {}\nAcceptance criteria count: {}\nTest case count: {}\n\n\
         User question: {message:?}\n\nAnswer using only information in the canvas.",
        canvas.ticket_summary.problem,
        canvas.acceptance_criteria.len(),
        canvas.test_cases.len(),
    );
    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_prompt_includes_hints() {
        let (_, user) = classification_prompt("fix it", &[], &["criteria".to_string()]);
        assert!(user.contains("criteria"));
    }

    #[test]
    fn history_block_keeps_last_six_in_order() {
        let history: Vec<ChatMessage> = (0..10)
            .map(|i| ChatMessage {
                id: format!("m{i}"),
                role: crate::schema::requests::MessageRole::User,
                content: format!("msg {i}"),
                created_at: None,
            })
            .collect();
        let rendered = history_block(&history);
        assert!(rendered.contains("msg 9"));
        assert!(!rendered.contains("msg 3"));
    }
}
