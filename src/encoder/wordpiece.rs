//! Wordpiece sub-word tokenizer with a pre-computed vocabulary.
//!
//! Normalizes, tokenizes, and encodes text using greedy longest-prefix
//! matching against a fixed vocabulary. The vocabulary loads on a background
//! thread; calls block on a one-shot latch until it is available, and a load
//! failure degrades to an empty vocabulary that maps every sub-token to the
//! unknown id.
//!
//! No special handling for CJK input; do not expect parity with wordpiece
//! tokenizers that segment CJK characters individually.

use super::{EncodeError, EncodedTokens, TextEncoder};
use crate::context::NluContext;
use crate::sync::OnceLatch;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sentinel vocabulary entry for unencodable input.
const UNKNOWN: &str = "[UNK]";

/// Marker prepended to continuation pieces of a split word.
const SUFFIX_MARKER: &str = "##";

/// Sub-word string to token id mapping, immutable once loaded.
struct Vocabulary {
    entries: HashMap<String, i64>,
    unknown_id: i64,
}

impl Vocabulary {
    fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            unknown_id: 0,
        }
    }

    fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = HashMap::new();
        for (index, line) in lines.into_iter().enumerate() {
            entries.insert(line.into(), index as i64);
        }
        let unknown_id = entries.get(UNKNOWN).copied().unwrap_or(0);
        Self {
            entries,
            unknown_id,
        }
    }

    fn load(path: &Path) -> io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let lines = reader.lines().collect::<io::Result<Vec<String>>>()?;
        Ok(Self::from_lines(lines))
    }

    fn id(&self, token: &str) -> Option<i64> {
        self.entries.get(token).copied()
    }

    fn has_unknown(&self) -> bool {
        self.entries.contains_key(UNKNOWN)
    }
}

/// Wordpiece token encoder with background vocabulary loading.
pub struct WordpieceEncoder {
    vocab: Arc<OnceLatch<Vocabulary>>,
}

impl WordpieceEncoder {
    /// Start loading the vocabulary at `path` on a background thread.
    ///
    /// The encoder is usable immediately: encoding calls block until loading
    /// completes. On a load failure an error trace event is dispatched and
    /// every lookup maps to the unknown id.
    pub fn new(path: impl Into<PathBuf>, context: Arc<NluContext>) -> Self {
        let path = path.into();
        let vocab = Arc::new(OnceLatch::new());
        let latch = Arc::clone(&vocab);
        let loader_context = Arc::clone(&context);
        thread::spawn(move || match Vocabulary::load(&path) {
            Ok(loaded) => {
                if !loaded.has_unknown() {
                    loader_context.trace_warn(&format!(
                        "Wordpiece vocabulary {} is missing the {} sentinel; using id 0",
                        path.display(),
                        UNKNOWN
                    ));
                }
                latch.set(loaded);
            }
            Err(e) => {
                loader_context
                    .trace_error(&format!("Error loading Wordpiece vocabulary: {}", e));
                latch.set(Vocabulary::empty());
            }
        });
        Self { vocab }
    }

    /// Build an encoder from an in-memory vocabulary, one entry per line,
    /// with the line index as the token id.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocab = Arc::new(OnceLatch::new());
        vocab.set(Vocabulary::from_lines(lines));
        Self { vocab }
    }

    /// Drop diacritics and split punctuation off the main word in a single
    /// pass. Input is expected to have been split on whitespace already.
    fn normalize_and_strip_punct(word: &str) -> Vec<String> {
        let mut sub_tokens = Vec::new();
        let mut run = String::new();
        for ch in word.nfd() {
            if is_punctuation(ch) {
                if !run.is_empty() {
                    sub_tokens.push(run.to_lowercase());
                    run.clear();
                }
                sub_tokens.push(ch.to_string());
            } else if !is_stripped(ch) {
                run.push(ch);
            }
        }
        if !run.is_empty() {
            sub_tokens.push(run.to_lowercase());
        }
        sub_tokens
    }

    /// Encode one normalized sub-token. A sub-token with any unencodable
    /// remainder encodes as a single unknown id; there is no continuation
    /// form of the sentinel.
    fn encode_pieces(vocab: &Vocabulary, sub_token: &str) -> Vec<i64> {
        let mut ids = Vec::new();
        if encode_longest(vocab, sub_token, "", &mut ids) {
            ids
        } else {
            vec![vocab.unknown_id]
        }
    }
}

/// Greedy longest-prefix match, recursing on the remainder with the
/// continuation marker prepended. Candidate prefixes keep at least one
/// character past the marker boundary. Returns false when some remainder
/// could not be encoded.
fn encode_longest(vocab: &Vocabulary, text: &str, prefix: &str, so_far: &mut Vec<i64>) -> bool {
    let combined = format!("{}{}", prefix, text);
    if let Some(id) = vocab.id(&combined) {
        so_far.push(id);
        return true;
    }

    let min_index = prefix.len();
    let boundaries: Vec<usize> = combined
        .char_indices()
        .map(|(i, _)| i)
        .filter(|&i| i > min_index)
        .collect();
    for &split in boundaries.iter().rev() {
        if let Some(id) = vocab.id(&combined[..split]) {
            so_far.push(id);
            return encode_longest(vocab, &combined[split..], SUFFIX_MARKER, so_far);
        }
    }
    false
}

/// Combining marks, format, and control characters are dropped entirely.
fn is_stripped(ch: char) -> bool {
    is_combining_mark(ch) || ch.is_control() || is_format(ch)
}

/// Format (Cf) characters commonly embedded in text: soft hyphen, zero-width
/// and bidi controls, word joiners, BOM.
fn is_format(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}

/// Punctuation: the ASCII set, the general punctuation block, and common
/// Latin-1 marks.
fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation()
        || ('\u{2010}'..='\u{2027}').contains(&ch)
        || ('\u{2030}'..='\u{205E}').contains(&ch)
        || matches!(ch, '¡' | '§' | '«' | '¶' | '·' | '»' | '¿')
}

impl TextEncoder for WordpieceEncoder {
    fn encode(&self, text: &str) -> Result<EncodedTokens, EncodeError> {
        let vocab = self.vocab.wait();
        let mut encoded = EncodedTokens::new(text);
        for (word_index, word) in text.split_whitespace().enumerate() {
            for sub_token in Self::normalize_and_strip_punct(word) {
                for id in Self::encode_pieces(&vocab, &sub_token) {
                    encoded.push(id, word_index);
                }
            }
        }
        Ok(encoded)
    }

    fn encode_single(&self, token: &str) -> i64 {
        let vocab = self.vocab.wait();
        vocab.id(token).unwrap_or(vocab.unknown_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TraceLevel;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn encoder(lines: &[&str]) -> WordpieceEncoder {
        WordpieceEncoder::from_lines(lines.iter().copied())
    }

    #[test]
    fn test_whole_word_match() {
        let enc = encoder(&["[UNK]", "hello", "world"]);
        let encoded = enc.encode("hello world").unwrap();
        assert_eq!(encoded.ids(), &[1, 2]);
        assert_eq!(encoded.word_indices(), &[0, 1]);
    }

    #[test]
    fn test_longest_match_with_continuation() {
        let enc = encoder(&["[UNK]", "play", "##ing", "##er"]);
        let encoded = enc.encode("playing player").unwrap();
        assert_eq!(encoded.ids(), &[1, 2, 1, 3]);
        assert_eq!(encoded.word_indices(), &[0, 0, 1, 1]);
    }

    #[test]
    fn test_prefers_longest_prefix() {
        // "playing" present as a whole entry wins over "play" + "##ing"
        let enc = encoder(&["[UNK]", "play", "##ing", "playing"]);
        let encoded = enc.encode("playing").unwrap();
        assert_eq!(encoded.ids(), &[3]);
    }

    #[test]
    fn test_unencodable_remainder_discards_partials() {
        // "play" matches but "##grounds" has no entry: the whole word
        // collapses to one unknown id, not "play" + unknown
        let enc = encoder(&["[UNK]", "play"]);
        let encoded = enc.encode("playgrounds").unwrap();
        assert_eq!(encoded.ids(), &[0]);
        assert_eq!(encoded.word_indices(), &[0]);
    }

    #[test]
    fn test_unknown_single_word() {
        let enc = encoder(&["[UNK]", "hello"]);
        let encoded = enc.encode("zzz").unwrap();
        assert_eq!(encoded.ids(), &[0]);
    }

    #[test]
    fn test_punctuation_splits_off() {
        let enc = encoder(&["[UNK]", "don", "'", "t", "ok", "!"]);
        let encoded = enc.encode("don't ok!").unwrap();
        assert_eq!(encoded.ids(), &[1, 2, 3, 4, 5]);
        assert_eq!(encoded.word_indices(), &[0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_lowercases_and_strips_diacritics() {
        let enc = encoder(&["[UNK]", "cafe"]);
        let encoded = enc.encode("Café").unwrap();
        assert_eq!(encoded.ids(), &[1]);
    }

    #[test]
    fn test_empty_input_yields_no_tokens() {
        let enc = encoder(&["[UNK]"]);
        assert!(enc.encode("").unwrap().is_empty());
        assert!(enc.encode("   ").unwrap().is_empty());
    }

    #[test]
    fn test_stripped_only_word_emits_nothing() {
        let enc = encoder(&["[UNK]", "a", "b"]);
        // the middle "word" is a lone combining acute accent
        let encoded = enc.encode("a \u{0301} b").unwrap();
        assert_eq!(encoded.ids(), &[1, 2]);
        assert_eq!(encoded.word_indices(), &[0, 2]);
    }

    #[test]
    fn test_encode_single() {
        let enc = encoder(&["[UNK]", "hello"]);
        assert_eq!(enc.encode_single("hello"), 1);
        assert_eq!(enc.encode_single("zzz"), 0);
    }

    #[test]
    fn test_unknown_sentinel_position() {
        let enc = encoder(&["pad", "hello", "[UNK]"]);
        assert_eq!(enc.encode_single("zzz"), 2);
    }

    #[test]
    fn test_load_failure_degrades_to_unknown() {
        let context = Arc::new(NluContext::new());
        let errored = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&errored);
        context.add_trace_listener(Box::new(move |level, _| {
            if level == TraceLevel::Error {
                seen.store(true, Ordering::SeqCst);
            }
        }));

        let enc = WordpieceEncoder::new("/nonexistent/vocab.txt", Arc::clone(&context));
        let encoded = enc.encode("hello world").unwrap();
        assert_eq!(encoded.ids(), &[0, 0]);
        assert!(errored.load(Ordering::SeqCst));
    }
}
