//! Built-in slot value parsers.
//!
//! One implementation per built-in slot type: `entity` (identity),
//! `integer` (digit strings and English number words), and `digits`
//! (spoken digit sequences). Custom parsers register through the engine
//! builder under their own names.

use super::{ParseError, SlotParser, SlotValue};
use crate::metadata::SlotMeta;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashMap;

/// Identity parser: the raw text is the value.
pub struct EntityParser;

impl SlotParser for EntityParser {
    fn parse(
        &self,
        _metadata: &SlotMeta,
        raw_value: &str,
        _context: &mut HashMap<String, String>,
    ) -> Result<Option<SlotValue>, ParseError> {
        Ok(Some(SlotValue::Text(raw_value.to_string())))
    }
}

/// Splits raw values on whitespace and hyphens.
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]+").unwrap());

/// Cardinal and ordinal number words with their values.
static NUMBER_WORDS: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    HashMap::from([
        ("zero", 0),
        ("oh", 0),
        ("one", 1),
        ("first", 1),
        ("two", 2),
        ("second", 2),
        ("three", 3),
        ("third", 3),
        ("four", 4),
        ("fourth", 4),
        ("five", 5),
        ("fifth", 5),
        ("six", 6),
        ("sixth", 6),
        ("seven", 7),
        ("seventh", 7),
        ("eight", 8),
        ("eighth", 8),
        ("nine", 9),
        ("ninth", 9),
        ("ten", 10),
        ("tenth", 10),
        ("eleven", 11),
        ("eleventh", 11),
        ("twelve", 12),
        ("twelfth", 12),
        ("thirteen", 13),
        ("thirteenth", 13),
        ("fourteen", 14),
        ("fourteenth", 14),
        ("fifteen", 15),
        ("fifteenth", 15),
        ("sixteen", 16),
        ("sixteenth", 16),
        ("seventeen", 17),
        ("seventeenth", 17),
        ("eighteen", 18),
        ("eighteenth", 18),
        ("nineteen", 19),
        ("nineteenth", 19),
        ("twenty", 20),
        ("twentieth", 20),
        ("thirty", 30),
        ("thirtieth", 30),
        ("forty", 40),
        ("fortieth", 40),
        ("fifty", 50),
        ("fiftieth", 50),
        ("sixty", 60),
        ("sixtieth", 60),
        ("seventy", 70),
        ("seventieth", 70),
        ("eighty", 80),
        ("eightieth", 80),
        ("ninety", 90),
        ("ninetieth", 90),
    ])
});

/// Scale words applied to the running group value.
static MULTIPLIERS: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    HashMap::from([
        ("hundred", 100),
        ("hundredth", 100),
        ("thousand", 1_000),
        ("thousandth", 1_000),
        ("million", 1_000_000),
        ("millionth", 1_000_000),
        ("billion", 1_000_000_000),
        ("billionth", 1_000_000_000),
    ])
});

/// Parses integers from digit strings or English number words.
///
/// Facets `{"min": .., "max": ..}` range-check the parsed value; an
/// out-of-range or unparseable value is `None`, not an error.
pub struct IntegerParser;

impl IntegerParser {
    fn parse_words(raw: &str) -> Option<i64> {
        let mut total: i64 = 0;
        let mut group: i64 = 0;
        let mut seen = false;
        for word in SEPARATORS.split(raw).filter(|w| !w.is_empty()) {
            if word == "and" {
                continue;
            }
            if let Some(&value) = NUMBER_WORDS.get(word) {
                group += value;
                seen = true;
            } else if let Some(&scale) = MULTIPLIERS.get(word) {
                // a bare "hundred"/"thousand" means one of them
                let base = if group == 0 { 1 } else { group };
                if scale >= 1_000 {
                    total += base * scale;
                    group = 0;
                } else {
                    group = base * scale;
                }
                seen = true;
            } else {
                return None;
            }
        }
        if seen {
            Some(total + group)
        } else {
            None
        }
    }

    fn facet_i64(metadata: &SlotMeta, key: &str) -> Result<Option<i64>, ParseError> {
        let Some(facets) = &metadata.facets else {
            return Ok(None);
        };
        match facets.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| ParseError::InvalidFacets {
                    slot_type: metadata.slot_type.clone(),
                    reason: format!("{} is not an integer: {}", key, value),
                }),
        }
    }
}

impl SlotParser for IntegerParser {
    fn parse(
        &self,
        metadata: &SlotMeta,
        raw_value: &str,
        _context: &mut HashMap<String, String>,
    ) -> Result<Option<SlotValue>, ParseError> {
        let cleaned = raw_value.trim().to_lowercase();
        let parsed = match cleaned.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => Self::parse_words(&cleaned),
        };
        let Some(value) = parsed else {
            return Ok(None);
        };

        if let Some(min) = Self::facet_i64(metadata, "min")? {
            if value < min {
                return Ok(None);
            }
        }
        if let Some(max) = Self::facet_i64(metadata, "max")? {
            if value > max {
                return Ok(None);
            }
        }
        Ok(Some(SlotValue::Integer(value)))
    }
}

/// Single digit words, including common ASR homophones.
static DIGIT_WORDS: Lazy<HashMap<&'static str, char>> = Lazy::new(|| {
    HashMap::from([
        ("zero", '0'),
        ("oh", '0'),
        ("o", '0'),
        ("one", '1'),
        ("won", '1'),
        ("two", '2'),
        ("to", '2'),
        ("too", '2'),
        ("three", '3'),
        ("four", '4'),
        ("for", '4'),
        ("five", '5'),
        ("six", '6'),
        ("seven", '7'),
        ("eight", '8'),
        ("ate", '8'),
        ("nine", '9'),
    ])
});

/// Normalizes a spoken digit sequence to a digit string.
///
/// Handles literal digit runs, digit words and homophones, and the
/// "double"/"triple" repetition idiom. Facets `{"count": ..}` reject
/// sequences of the wrong length.
pub struct DigitsParser;

impl SlotParser for DigitsParser {
    fn parse(
        &self,
        metadata: &SlotMeta,
        raw_value: &str,
        _context: &mut HashMap<String, String>,
    ) -> Result<Option<SlotValue>, ParseError> {
        let cleaned = raw_value.trim().to_lowercase();
        let mut digits = String::new();
        let mut repeat = 1;
        for word in SEPARATORS.split(&cleaned).filter(|w| !w.is_empty()) {
            if word == "double" {
                repeat = 2;
                continue;
            }
            if word == "triple" {
                repeat = 3;
                continue;
            }
            if let Some(&digit) = DIGIT_WORDS.get(word) {
                for _ in 0..repeat {
                    digits.push(digit);
                }
            } else if word.chars().all(|c| c.is_ascii_digit()) {
                for _ in 0..repeat {
                    digits.push_str(word);
                }
            } else {
                return Ok(None);
            }
            repeat = 1;
        }
        if digits.is_empty() {
            return Ok(None);
        }

        if let Some(facets) = &metadata.facets {
            if let Some(count) = facets.get("count") {
                let count = count
                    .as_u64()
                    .ok_or_else(|| ParseError::InvalidFacets {
                        slot_type: metadata.slot_type.clone(),
                        reason: format!("count is not an integer: {}", count),
                    })?;
                if digits.chars().count() as u64 != count {
                    return Ok(None);
                }
            }
        }
        Ok(Some(SlotValue::Text(digits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(slot_type: &str, facets: Option<serde_json::Value>) -> SlotMeta {
        SlotMeta {
            name: "value".into(),
            slot_type: slot_type.into(),
            facets,
        }
    }

    fn parse(
        parser: &dyn SlotParser,
        metadata: &SlotMeta,
        raw: &str,
    ) -> Result<Option<SlotValue>, ParseError> {
        parser.parse(metadata, raw, &mut HashMap::new())
    }

    #[test]
    fn test_entity_is_identity() {
        let metadata = meta("entity", None);
        let value = parse(&EntityParser, &metadata, "the Big Lebowski").unwrap();
        assert_eq!(value, Some(SlotValue::Text("the Big Lebowski".into())));
    }

    #[test]
    fn test_integer_digits() {
        let metadata = meta("integer", None);
        assert_eq!(
            parse(&IntegerParser, &metadata, "42").unwrap(),
            Some(SlotValue::Integer(42))
        );
        assert_eq!(
            parse(&IntegerParser, &metadata, " -7 ").unwrap(),
            Some(SlotValue::Integer(-7))
        );
    }

    #[test]
    fn test_integer_words() {
        let metadata = meta("integer", None);
        let cases = [
            ("one", 1),
            ("thirteen", 13),
            ("forty-two", 42),
            ("forty two", 42),
            ("one hundred twelve", 112),
            ("two hundred and five", 205),
            ("three thousand", 3000),
            ("one million two hundred thousand", 1_200_000),
            ("third", 3),
            ("twentieth", 20),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                parse(&IntegerParser, &metadata, raw).unwrap(),
                Some(SlotValue::Integer(expected)),
                "raw: {}",
                raw
            );
        }
    }

    #[test]
    fn test_integer_rejects_non_numbers() {
        let metadata = meta("integer", None);
        assert_eq!(parse(&IntegerParser, &metadata, "blue").unwrap(), None);
        assert_eq!(parse(&IntegerParser, &metadata, "").unwrap(), None);
        assert_eq!(
            parse(&IntegerParser, &metadata, "one basket").unwrap(),
            None
        );
    }

    #[test]
    fn test_integer_range_facets() {
        let metadata = meta("integer", Some(serde_json::json!({"min": 1, "max": 10})));
        assert_eq!(
            parse(&IntegerParser, &metadata, "5").unwrap(),
            Some(SlotValue::Integer(5))
        );
        assert_eq!(parse(&IntegerParser, &metadata, "0").unwrap(), None);
        assert_eq!(parse(&IntegerParser, &metadata, "eleven").unwrap(), None);
    }

    #[test]
    fn test_integer_bad_facets() {
        let metadata = meta("integer", Some(serde_json::json!({"min": "low"})));
        assert!(matches!(
            parse(&IntegerParser, &metadata, "5"),
            Err(ParseError::InvalidFacets { .. })
        ));
    }

    #[test]
    fn test_digits_words_and_literals() {
        let metadata = meta("digits", None);
        assert_eq!(
            parse(&DigitsParser, &metadata, "one two three").unwrap(),
            Some(SlotValue::Text("123".into()))
        );
        assert_eq!(
            parse(&DigitsParser, &metadata, "555 1212").unwrap(),
            Some(SlotValue::Text("5551212".into()))
        );
        assert_eq!(
            parse(&DigitsParser, &metadata, "oh one").unwrap(),
            Some(SlotValue::Text("01".into()))
        );
    }

    #[test]
    fn test_digits_homophones() {
        let metadata = meta("digits", None);
        assert_eq!(
            parse(&DigitsParser, &metadata, "won to for ate").unwrap(),
            Some(SlotValue::Text("1248".into()))
        );
    }

    #[test]
    fn test_digits_repetition() {
        let metadata = meta("digits", None);
        assert_eq!(
            parse(&DigitsParser, &metadata, "double five nine").unwrap(),
            Some(SlotValue::Text("559".into()))
        );
        assert_eq!(
            parse(&DigitsParser, &metadata, "triple eight").unwrap(),
            Some(SlotValue::Text("888".into()))
        );
    }

    #[test]
    fn test_digits_count_facet() {
        let metadata = meta("digits", Some(serde_json::json!({"count": 3})));
        assert_eq!(
            parse(&DigitsParser, &metadata, "one two three").unwrap(),
            Some(SlotValue::Text("123".into()))
        );
        assert_eq!(parse(&DigitsParser, &metadata, "one two").unwrap(), None);
    }

    #[test]
    fn test_digits_rejects_non_digits() {
        let metadata = meta("digits", None);
        assert_eq!(parse(&DigitsParser, &metadata, "call me").unwrap(), None);
        assert_eq!(parse(&DigitsParser, &metadata, "").unwrap(), None);
    }
}
