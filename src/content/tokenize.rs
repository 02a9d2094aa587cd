// src/content/tokenize.rs
// =============================================================================
// Splits text into lower-case words.
//
// A word is a run of ASCII letters and digits; everything else (spaces,
// punctuation, non-ASCII characters) separates words.
//
//   "Hello, World! 2024's best" -> ["hello", "world", "2024", "s", "best"]
//
// One pass over the characters: O(n) in the length of the text.
// =============================================================================

pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            current.push(c.to_ascii_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
