//! Prompt templates for the Regenerator's four section rewrites. Each takes
//! the analyzer's [`BaseContext`] plus the section's prior content and the
//! user's feedback, so the model rewrites in place of the original rather
//! than generating blind.

use crate::analyzer::context::BaseContext;
use crate::schema::qa_profile::TestCaseFormat;

fn feedback_block(feedback: &str, conversation_excerpt: &str) -> String {
    format!(
        "User feedback driving this regeneration: {feedback:?}\n\nRecent conversation:\n{}",
        if conversation_excerpt.is_empty() {
            "(none)".to_string()
        } else {
            conversation_excerpt.to_string()
        }
    )
}

pub fn ticket_summary_prompt(
    ctx: &BaseContext,
    previous_json: &str,
    feedback: &str,
    conversation_excerpt: &str,
) -> (String, String) {
    let system = "You are a QA analyst revising a ticket summary in response to user feedback. \
        Respond with a single JSON object: {\"problem\": string, \"solution\": string, \
        \"context\": string}. Output only the JSON object, no prose, no code fences."
        .to_string();
    let user = format!(
        "{}\n\nPrevious ticket_summary:\n{previous_json}\n\n{}\n\nProduce the revised \
         ticket_summary JSON object, keeping anything the feedback did not ask to change.",
        ctx.render(),
        feedback_block(feedback, conversation_excerpt),
    );
    (system, user)
}

pub fn acceptance_criteria_prompt(
    ctx: &BaseContext,
    previous_json: &str,
    feedback: &str,
    conversation_excerpt: &str,
) -> (String, String) {
    let system = "You are a QA analyst revising acceptance criteria in response to user \
        feedback. Respond with a JSON array of objects: {\"title\": string, \"description\": \
        string, \"priority\": \"must\"|\"should\"|\"could\", \"category\": string, \
        \"testable\": bool}. Output only the JSON array, no prose, no code fences. Do not \
        include an \"id\" field — ids are assigned by the caller. Preserve criteria the \
        feedback did not ask to change, in the same relative order."
        .to_string();
    let user = format!(
        "{}\n\nPrevious acceptance_criteria:\n{previous_json}\n\n{}\n\nProduce the revised \
         acceptance_criteria JSON array.",
        ctx.render(),
        feedback_block(feedback, conversation_excerpt),
    );
    (system, user)
}

fn test_case_shape_hint(format: TestCaseFormat) -> &'static str {
    match format {
        TestCaseFormat::Gherkin => {
            "{\"scenario\": string, \"given\": [string], \"when\": [string], \"then\": [string], \
             \"tags\": [string], \"category\": string, \"priority\": \"high\"|\"medium\"|\"low\"}"
        }
        TestCaseFormat::Steps => {
            "{\"title\": string, \"objective\": string, \"preconditions\": [string], \
             \"steps\": [{\"step_number\": number, \"action\": string, \"expected_result\": string}], \
             \"postconditions\": [string], \"category\": string, \"priority\": \"high\"|\"medium\"|\"low\"}"
        }
        TestCaseFormat::Table => {
            "{\"title\": string, \"description\": string, \"expected_outcome\": string, \
             \"category\": string, \"priority\": \"high\"|\"medium\"|\"low\"}"
        }
    }
}

pub fn test_cases_prompt(
    ctx: &BaseContext,
    previous_json: &str,
    feedback: &str,
    conversation_excerpt: &str,
) -> (String, String) {
    let shape = test_case_shape_hint(ctx.active_format);
    let system = format!(
        "You are a QA analyst revising test cases in the \"{:?}\" format in response to user \
         feedback. Respond with a JSON array of objects shaped like: {shape}. Output only the \
         JSON array, no prose, no code fences. Do not include an \"id\" field. Preserve test \
         cases the feedback did not ask to change, in the same relative order.",
        ctx.active_format,
    );
    let user = format!(
        "{}\n\nPrevious test_cases:\n{previous_json}\n\n{}\n\nProduce the revised test_cases \
         JSON array.",
        ctx.render(),
        feedback_block(feedback, conversation_excerpt),
    );
    (system, user)
}

pub fn configuration_warnings_prompt(
    ctx: &BaseContext,
    previous_json: &str,
    feedback: &str,
) -> (String, String) {
    let system = "You are a QA analyst re-evaluating configuration warnings after a canvas \
        revision. Respond with a JSON array of objects: {\"type\": string, \"title\": string, \
        \"message\": string, \"recommendation\": string, \"severity\": \"low\"|\"medium\"|\"high\"}. \
        If nothing is worth flagging, respond with an empty JSON array []. Output only the JSON \
        array, no prose, no code fences."
        .to_string();
    let user = format!(
        "{}\n\nPrevious configuration_warnings:\n{previous_json}\n\nFeedback applied: \
         {feedback:?}\n\nProduce the revised configuration_warnings JSON array.",
        ctx.render(),
    );
    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BaseContext {
        BaseContext {
            issue_key: "TEST-1".into(),
            summary: "s".into(),
            description: "d".into(),
            status: "Open".into(),
            priority: "High".into(),
            issue_type: "Bug".into(),
            components: Vec::new(),
            recent_comments: Vec::new(),
            custom_fields_head: Vec::new(),
            active_categories: vec!["functional".into()],
            active_format: TestCaseFormat::Gherkin,
        }
    }

    #[test]
    fn ticket_summary_prompt_includes_previous_content_and_feedback() {
        let (_, user) = ticket_summary_prompt(&ctx(), "{\"problem\":\"old\"}", "make it clearer", "");
        assert!(user.contains("old"));
        assert!(user.contains("make it clearer"));
    }

    #[test]
    fn test_cases_prompt_reflects_active_format_in_shape_hint() {
        let mut c = ctx();
        c.active_format = TestCaseFormat::Table;
        let (system, _) = test_cases_prompt(&c, "[]", "add more", "");
        assert!(system.contains("expected_outcome"));
    }
}
