// Input validation utilities

/// Normalize a user-entered data filename.
///
/// Trims surrounding whitespace and appends the `.json` extension when it
/// is missing. Idempotent: normalizing an already-suffixed name returns it
/// unchanged.
pub fn normalize_json_filename(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.ends_with(".json") {
        trimmed.to_string()
    } else {
        format!("{}.json", trimmed)
    }
}

/// Validate a filename entered on a wizard page. Empty input is rejected
/// locally; the page does not advance.
pub fn validate_filename(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Filename is required".to_string());
    }
    Ok(normalize_json_filename(trimmed))
}
