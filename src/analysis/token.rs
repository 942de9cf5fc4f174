use serde::{Deserialize, Serialize};

/// Token produced by a tokenizer pass. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Normalized term text (lower-cased).
    pub text: String,
    /// Byte offset of the token in the original input.
    pub offset: usize,
    /// Byte length of the token in the original input. Bigram tokens cover
    /// the two source characters of their window.
    pub length: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, offset: usize, length: usize) -> Self {
        Token {
            text: text.into(),
            offset,
            length,
        }
    }
}
