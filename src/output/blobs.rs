//! Extraction of JSON objects embedded in free-form text.

use serde_json::Value;
use tracing::trace;

/// Extract every JSON object embedded in `content`, left to right.
///
/// For each opening brace the scan tries the candidate spans ending at each
/// closing brace from the end of the text backwards and keeps the longest
/// one that decodes. Scanning then resumes just past the matched span, so
/// objects nested inside a match are not reported again. Spans that never
/// decode are skipped without error.
///
/// The search is quadratic in the worst case and does not track string
/// literals when choosing the closing brace: in `{"a": "{"}` the brace
/// inside the string is only considered after the outer span fails.
///
/// ```
/// use gowershell_client::extract_json_blobs;
/// use serde_json::json;
///
/// let blobs = extract_json_blobs(r#"Before {"name": "test"} after"#);
/// assert_eq!(blobs, vec![json!({"name": "test"})]);
/// ```
pub fn extract_json_blobs(content: &str) -> Vec<Value> {
    // Braces are ASCII, so every index below is a char boundary.
    let bytes = content.as_bytes();
    let mut blobs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' {
            for j in (i + 1..bytes.len()).rev() {
                if bytes[j] != b'}' {
                    continue;
                }
                if let Ok(value) = serde_json::from_str::<Value>(&content[i..=j]) {
                    trace!("JSON blob at {}..={}", i, j);
                    blobs.push(value);
                    i = j;
                    break;
                }
            }
        }
        i += 1;
    }

    trace!(
        "extracted {} JSON blobs from {} bytes",
        blobs.len(),
        content.len()
    );
    blobs
}
