//! Off-topic rejection — a fixed, deterministic response. No generative call
//! is made for `off_topic`: the whole point of classifying a message as off
//! topic is to avoid spending a model call on it.

use super::lexicon;

const ENGLISH_REJECTION: &str = "I'm focused on helping with this ticket's QA documentation — \
    the problem summary, acceptance criteria, test cases, and related warnings. I can't help \
    with that, but I'm happy to keep working on the canvas with you.";

const SPANISH_REJECTION: &str = "Me enfoco en ayudar con la documentación de QA de este ticket: \
    el resumen del problema, los criterios de aceptación, los casos de prueba y las \
    advertencias relacionadas. No puedo ayudar con eso, pero con gusto sigo trabajando \
    contigo en el canvas.";

/// The fixed rejection message, matched to the apparent language of `message`.
pub fn reject(message: &str) -> String {
    if lexicon::guess_is_spanish(message) {
        SPANISH_REJECTION.to_string()
    } else {
        ENGLISH_REJECTION.to_string()
    }
}
