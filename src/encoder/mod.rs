//! Text encoding: sub-word tokenization with word alignment.

pub mod wordpiece;

pub use wordpiece::WordpieceEncoder;

use thiserror::Error;

/// Encoding errors.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Invalid token range {start}..{end} for {len} tokens")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Encoder failure: {0}")]
    Internal(String),
}

/// Maps text to sub-word token ids for model input.
pub trait TextEncoder: Send + Sync {
    /// Encode an utterance into token ids plus word alignment.
    fn encode(&self, text: &str) -> Result<EncodedTokens, EncodeError>;

    /// Encode a single pre-split token, falling back to the unknown id.
    fn encode_single(&self, token: &str) -> i64;
}

/// Ordered token ids plus the mapping back to the originating words.
///
/// Several sub-word tokens may map to the same original word; words that
/// normalize to nothing contribute no ids and no alignment entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedTokens {
    words: Vec<String>,
    ids: Vec<i64>,
    word_indices: Vec<usize>,
}

impl EncodedTokens {
    /// Start encoding an utterance, capturing its whitespace-separated words.
    pub fn new(text: &str) -> Self {
        Self {
            words: text.split_whitespace().map(str::to_string).collect(),
            ids: Vec::new(),
            word_indices: Vec::new(),
        }
    }

    /// Append one token id originating from word `word_index`.
    pub fn push(&mut self, id: i64, word_index: usize) {
        debug_assert!(word_index < self.words.len());
        self.ids.push(id);
        self.word_indices.push(word_index);
    }

    /// The encoded token ids, in order.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// The originating word index for each token, parallel to [`ids`](Self::ids).
    pub fn word_indices(&self) -> &[usize] {
        &self.word_indices
    }

    /// Number of encoded tokens.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when no tokens were produced.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Reassemble the original words covering the token range `start..end`,
    /// with original casing, joined by single spaces.
    pub fn decode_range(&self, start: usize, end: usize) -> Result<String, EncodeError> {
        if start >= end || end > self.ids.len() {
            return Err(EncodeError::InvalidRange {
                start,
                end,
                len: self.ids.len(),
            });
        }
        let first = self.word_indices[start];
        let last = self.word_indices[end - 1];
        Ok(self.words[first..=last].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_range_spans_words() {
        let mut encoded = EncodedTokens::new("Set a Timer now");
        // "Timer" splits into two sub-word tokens
        encoded.push(10, 0);
        encoded.push(11, 1);
        encoded.push(12, 2);
        encoded.push(13, 2);
        encoded.push(14, 3);

        assert_eq!(encoded.len(), 5);
        assert_eq!(encoded.decode_range(0, 2).unwrap(), "Set a");
        assert_eq!(encoded.decode_range(2, 4).unwrap(), "Timer");
        assert_eq!(encoded.decode_range(2, 5).unwrap(), "Timer now");
    }

    #[test]
    fn test_decode_range_rejects_bad_bounds() {
        let mut encoded = EncodedTokens::new("one two");
        encoded.push(1, 0);
        encoded.push(2, 1);

        assert!(encoded.decode_range(0, 3).is_err());
        assert!(encoded.decode_range(1, 1).is_err());
        assert!(encoded.decode_range(2, 1).is_err());
    }

    #[test]
    fn test_empty_input() {
        let encoded = EncodedTokens::new("");
        assert!(encoded.is_empty());
        assert_eq!(encoded.ids(), &[] as &[i64]);
    }
}
