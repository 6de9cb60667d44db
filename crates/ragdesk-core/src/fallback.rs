//! Mock payloads served when the RAG backend cannot be reached.
//!
//! Each builder returns the same JSON shape the real backend would, so callers only see
//! the difference in the content itself.

use serde_json::{json, Value};
use uuid::Uuid;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const FALLBACK_ID_LEN: usize = 13;
const CANNED_RESULT_COUNT: usize = 3;

/// `len` random lowercase base36 characters (at most 24; a v4 uuid carries 122 random bits).
pub(crate) fn random_base36(len: usize) -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(len);
    for _ in 0..len.min(24) {
        out.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}

/// Templated explanation standing in for generated text. Always echoes the prompt.
pub fn generated_text(prompt: &str, backend_url: &str) -> String {
    format!(
        r#"AI Generated Response for: "{prompt}"

This is a simulated AI response that demonstrates text generation capabilities. In a real implementation, this would connect to an actual language model like OpenAI's GPT, Claude, or a local model.

Key points about your prompt:
• Your input was: "{prompt}"
• The AI would analyze the context and intent
• Generate relevant, coherent text based on the input
• Provide helpful and informative responses

This mock response shows how the interface would work with a real AI backend. The text generation feature could be used for:
- Creative writing assistance
- Code generation and explanation
- Question answering
- Content creation
- And much more!

Note: Backend at {backend_url} is not available, showing mock response."#
    )
}

/// `{ "text": ... }` for `/api/generate`.
pub fn generate_payload(prompt: &str, backend_url: &str) -> Value {
    json!({ "text": generated_text(prompt, backend_url) })
}

/// `{ "id": ... }` for `/api/data`: a random 13-character base36 id.
pub fn data_payload() -> Value {
    json!({ "id": random_base36(FALLBACK_ID_LEN) })
}

/// `{ "results": [...] }` for `/api/search/similar`.
pub fn similar_payload(query: &str, limit: Option<usize>) -> Value {
    let results: Vec<String> = (1..=CANNED_RESULT_COUNT)
        .map(|n| format!(r#"Similar result {n} for query: "{query}""#))
        .take(limit.unwrap_or(CANNED_RESULT_COUNT))
        .collect();
    json!({ "results": results })
}

/// `{ "results": [...] }` for `/api/search/text`.
pub fn text_search_payload(query: &str, limit: Option<usize>) -> Value {
    let results: Vec<String> = (1..=CANNED_RESULT_COUNT)
        .map(|n| format!(r#"Text search result {n} for: "{query}""#))
        .take(limit.unwrap_or(CANNED_RESULT_COUNT))
        .collect();
    json!({ "results": results })
}
