//! Explicit, struct-valued prompt templates for the analyzer's four section
//! generations — pure functions from [`BaseContext`] to `(system, user)`
//! prompt strings, per §9's "dynamically constructed prompts" redesign
//! note. No object spread, no runtime callbacks: every prompt is assembled
//! by a plain function a reader can trace start to finish.

use super::context::BaseContext;
use crate::schema::qa_profile::TestCaseFormat;

pub fn ticket_summary_prompt(ctx: &BaseContext) -> (String, String) {
    let system = "You are a QA analyst. Summarize a ticket into a problem statement, the \
        proposed solution, and surrounding context. Respond with a single JSON object: \
        {\"problem\": string, \"solution\": string, \"context\": string}. Output only the \
        JSON object, no prose, no code fences."
        .to_string();
    let user = format!(
        "{}\n\nProduce the ticket_summary JSON object for this ticket.",
        ctx.render()
    );
    (system, user)
}

pub fn acceptance_criteria_prompt(ctx: &BaseContext) -> (String, String) {
    let system = "You are a QA analyst. Derive 3 to 5 acceptance criteria from a ticket. \
        Respond with a JSON array of objects: {\"title\": string, \"description\": string, \
        \"priority\": \"must\"|\"should\"|\"could\", \"category\": string, \"testable\": bool}. \
        Output only the JSON array, no prose, no code fences. Do not include an \"id\" field — \
        ids are assigned by the caller."
        .to_string();
    let user = format!(
        "{}\n\nProduce 3 to 5 acceptance criteria as a JSON array.",
        ctx.render()
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

pub fn test_cases_prompt(ctx: &BaseContext) -> (String, String) {
    let shape = test_case_shape_hint(ctx.active_format);
    let system = format!(
        "You are a QA analyst. Write 3 to 5 test cases in the \"{:?}\" format covering the \
         active QA categories. Respond with a JSON array of objects shaped like: {shape}. \
         Output only the JSON array, no prose, no code fences. Do not include an \"id\" field.",
        ctx.active_format,
    );
    let user = format!(
        "{}\n\nProduce 3 to 5 test cases as a JSON array in the requested format, covering the \
         active QA categories where applicable.",
        ctx.render()
    );
    (system, user)
}

pub fn configuration_warnings_prompt(ctx: &BaseContext) -> (String, String) {
    let system = "You are a QA analyst. Identify configuration assumptions or gaps worth \
        flagging to a reviewer (e.g. no QA categories enabled, ambiguous requirements, missing \
        detail). Respond with a JSON array of objects: {\"type\": string, \"title\": string, \
        \"message\": string, \"recommendation\": string, \"severity\": \"low\"|\"medium\"|\"high\"}. \
        If nothing is worth flagging, respond with an empty JSON array []. Output only the JSON \
        array, no prose, no code fences."
        .to_string();
    let user = format!(
        "{}\n\nIdentify configuration warnings, if any, as a JSON array.",
        ctx.render()
    );
    (system, user)
}
