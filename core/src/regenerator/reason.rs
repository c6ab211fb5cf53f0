//! Closed-set keyword mapping from free-form feedback text to a
//! human-readable `regeneration_reason` (§4.5).

const ADDITION_KEYWORDS: &[&str] = &["add", "more", "agregar", "añadir", "más"];
const MODIFICATION_KEYWORDS: &[&str] = &["change", "update", "modify", "cambiar", "actualizar", "modificar"];
const QUALITY_KEYWORDS: &[&str] = &["improve", "better", "mejorar", "mejor"];
const CORRECTION_KEYWORDS: &[&str] = &["fix", "correct", "corregir", "arreglar"];

const DEFAULT_REASON: &str = "User feedback incorporation";

/// Classify `feedback` into the first matching closed-set reason, checked in
/// the order given by §4.5: addition, modification, quality, correction,
/// then the default catch-all.
pub fn derive_regeneration_reason(feedback: &str) -> String {
    let lower = feedback.to_lowercase();
    if ADDITION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        "Content addition".to_string()
    } else if MODIFICATION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        "Content modification".to_string()
    } else if QUALITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        "Quality improvement".to_string()
    } else if CORRECTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        "Error correction".to_string()
    } else {
        DEFAULT_REASON.to_string()
    }
}

/// Whether `feedback` explicitly asks for a major version bump rather than
/// the default minor (+0.1) increment.
pub fn is_major_revision_request(feedback: &str) -> bool {
    let lower = feedback.to_lowercase();
    ["major revision", "major version", "complete rewrite", "revisión mayor", "reescritura completa"]
        .iter()
        .any(|k| lower.contains(k))
}
