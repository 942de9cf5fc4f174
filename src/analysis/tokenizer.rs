use regex::Regex;

use crate::analysis::token::Token;

/// Text → ordered tokens. Implementations are pure and deterministic;
/// empty input yields an empty vec, never an error.
///
/// The same tokenizer must be used at index time and query time, otherwise
/// recall degrades silently.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn Tokenizer>;
}

impl Clone for Box<dyn Tokenizer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Default strategy: one Unicode word-class regex covering Latin letters,
/// digits and CJK ideographs. A contiguous CJK run comes out as a single
/// opaque term (coarse; see [`MixedTokenizer`] for the finer-grained one).
#[derive(Clone)]
pub struct StandardTokenizer {
    word: Regex,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            word: Regex::new(r"\w+").expect("valid regex"),
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        self.word
            .find_iter(text)
            .map(|m| Token::new(m.as_str().to_lowercase(), m.start(), m.len()))
            .collect()
    }

    fn name(&self) -> &str {
        "standard"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

/// Mixed CJK/Latin/numeric strategy.
///
/// Latin runs (internal hyphens/apostrophes allowed, "state-of-the-art")
/// become one lower-cased token; digit runs with at most one interior
/// decimal point become one token; each character of a CJK run becomes its
/// own token AND every contiguous 2-character window becomes an additional
/// bigram token. The unigram overlay buys recall for single-character
/// queries, the bigrams approximate word boundaries without a dictionary.
#[derive(Clone, Default)]
pub struct MixedTokenizer;

impl MixedTokenizer {
    pub fn new() -> Self {
        MixedTokenizer
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{3040}'..='\u{309F}' // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
    )
}

fn is_latin(c: char) -> bool {
    c.is_alphabetic() && !is_cjk(c)
}

impl Tokenizer for MixedTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let end_of = |k: usize| chars[k].0 + chars[k].1.len_utf8();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let (start, c) = chars[i];

            if is_latin(c) {
                let mut j = i + 1;
                while j < chars.len() {
                    let cj = chars[j].1;
                    if is_latin(cj) {
                        j += 1;
                    } else if (cj == '-' || cj == '\'')
                        && j + 1 < chars.len()
                        && is_latin(chars[j + 1].1)
                    {
                        j += 2;
                    } else {
                        break;
                    }
                }
                let end = end_of(j - 1);
                tokens.push(Token::new(text[start..end].to_lowercase(), start, end - start));
                i = j;
            } else if c.is_ascii_digit() {
                let mut j = i + 1;
                let mut seen_point = false;
                while j < chars.len() {
                    let cj = chars[j].1;
                    if cj.is_ascii_digit() {
                        j += 1;
                    } else if cj == '.'
                        && !seen_point
                        && j + 1 < chars.len()
                        && chars[j + 1].1.is_ascii_digit()
                    {
                        seen_point = true;
                        j += 2;
                    } else {
                        break;
                    }
                }
                let end = end_of(j - 1);
                tokens.push(Token::new(&text[start..end], start, end - start));
                i = j;
            } else if is_cjk(c) {
                let mut j = i + 1;
                while j < chars.len() && is_cjk(chars[j].1) {
                    j += 1;
                }
                for k in i..j {
                    let (off, ck) = chars[k];
                    tokens.push(Token::new(ck.to_string(), off, ck.len_utf8()));
                    if k + 1 < j {
                        let (_, cn) = chars[k + 1];
                        let mut pair = String::with_capacity(ck.len_utf8() + cn.len_utf8());
                        pair.push(ck);
                        pair.push(cn);
                        tokens.push(Token::new(pair, off, ck.len_utf8() + cn.len_utf8()));
                    }
                }
                i = j;
            } else {
                // Whitespace, punctuation, everything else.
                i += 1;
            }
        }

        tokens
    }

    fn name(&self) -> &str {
        "mixed"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}
