//! Best-effort reading of load job error messages

/// Marker the warehouse puts in messages about a schema/table mismatch.
pub const SCHEMA_MISMATCH_MARKER: &str = "Provided Schema does not match Table";

/// Pull the offending column out of a schema mismatch message.
///
/// Takes the text between the last `:` and the last `)`. Returns `None` for
/// any message that does not fit that shape. Never use the result to decide
/// control flow.
pub fn missing_schema_component(message: &str) -> Option<String> {
    if !message.contains(SCHEMA_MISMATCH_MARKER) {
        return None;
    }

    let colon = message.rfind(':')?;
    let paren = message.rfind(')')?;
    if colon >= paren {
        return None;
    }

    let component = message[colon + 1..paren].trim();
    (!component.is_empty()).then(|| component.to_string())
}
