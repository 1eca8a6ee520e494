// src/services/prompt.rs
use crate::message::GuestContext;

use super::retriever::RetrievedSnippet;

const NOT_PROVIDED: &str = "Not provided";
const CLOSING_INSTRUCTION: &str = "Please provide a helpful, personalized response based on the guest's context and the relevant hotel information.";

/// The "Guest Information" block, or `None` when the caller sent no context
/// or an empty one.
pub fn guest_block(guest: Option<&GuestContext>) -> Option<String> {
    let guest = guest.filter(|g| !g.is_empty())?;
    let field = |v: &Option<String>| v.as_deref().unwrap_or(NOT_PROVIDED).to_string();

    Some(format!(
        "Guest Information:\n\
         - Name: {}\n\
         - Room: {}\n\
         - Preferences: {}\n\
         - Previous Interactions: {}",
        field(&guest.name),
        field(&guest.room),
        field(&guest.preferences),
        field(&guest.previous_interactions),
    ))
}

pub fn build_prompt(
    message: &str,
    guest: Option<&GuestContext>,
    snippets: &[RetrievedSnippet],
) -> String {
    let context = snippets
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let mut sections = Vec::with_capacity(4);
    if let Some(block) = guest_block(guest) {
        sections.push(block);
    }
    sections.push(format!("Relevant Hotel Information:\n{context}"));
    sections.push(format!("Guest Question: {message}"));
    sections.push(CLOSING_INSTRUCTION.to_string());

    sections.join("\n\n")
}
