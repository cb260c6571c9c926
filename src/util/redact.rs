/// Masks all but the first four characters of a secret for log output.
pub(crate) fn redact(input: &str) -> String {
    match input.char_indices().nth(4) {
        Some((cut, _)) => format!("{}***", &input[..cut]),
        None => "****".to_string(),
    }
}
