/// Normalize a barcode typed or pasted by the user.
///
/// Surrounding whitespace is dropped; blank input yields `None`.
pub fn normalize_manual_entry(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
