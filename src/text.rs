use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "between", "both", "but", "by", "can", "could",
    "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further",
    "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "itself", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over",
    "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Characters matching this pattern are deleted before splitting.
    pub strip_pattern: String,
    pub min_token_len: usize,
    pub remove_stop_words: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            strip_pattern: r"[^\w\s]".to_string(),
            min_token_len: 2,
            remove_stop_words: false,
        }
    }
}

/// Turns raw review text into a token sequence: lowercase, strip
/// non-word characters, split on whitespace.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    strip_re: Regex,
    min_token_len: usize,
    stop_words: HashSet<&'static str>,
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        let strip_re = Regex::new(&config.strip_pattern).map_err(|e| {
            TopicError::Configuration(format!(
                "invalid strip_pattern {:?}: {}",
                config.strip_pattern, e
            ))
        })?;

        let stop_words = if config.remove_stop_words {
            ENGLISH_STOP_WORDS.iter().copied().collect()
        } else {
            HashSet::new()
        };

        Ok(Tokenizer {
            strip_re,
            min_token_len: config.min_token_len,
            stop_words,
        })
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = self.strip_re.replace_all(&lowered, "");

        cleaned
            .split_whitespace()
            .filter(|word| word.chars().count() >= self.min_token_len)
            .filter(|word| !self.stop_words.contains(word))
            .map(|word| word.to_string())
            .collect()
    }

    pub fn tokenize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<String>> {
        texts.iter().map(|text| self.tokenize(text.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_tokenizer() -> Tokenizer {
        Tokenizer::new(&TokenizerConfig::default()).expect("default pattern compiles")
    }

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let tokens = default_tokenizer().tokenize("Great Coffee!! Would buy again, 10/10.");
        assert_eq!(tokens, vec!["great", "coffee", "would", "buy", "again", "1010"]);
    }

    #[test]
    fn test_drops_short_tokens() {
        let tokens = default_tokenizer().tokenize("I a am ok");
        assert_eq!(tokens, vec!["am", "ok"]);
    }

    #[test]
    fn test_stop_words_removed_when_enabled() {
        let config = TokenizerConfig {
            remove_stop_words: true,
            ..TokenizerConfig::default()
        };
        let tokenizer = Tokenizer::new(&config).expect("tokenizer");
        assert_eq!(tokenizer.tokenize("The tea was stale"), vec!["tea", "stale"]);
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let config = TokenizerConfig {
            strip_pattern: "[".to_string(),
            ..TokenizerConfig::default()
        };
        assert!(matches!(
            Tokenizer::new(&config),
            Err(TopicError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_text_yields_empty_document() {
        assert!(default_tokenizer().tokenize("  ?! ").is_empty());
    }
}
