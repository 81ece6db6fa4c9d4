//! Raw model output decoding: intent arg-max and BIO slot spans.
//!
//! Turns the model's posterior buffers into a chosen intent and a map of
//! slot name to the raw utterance substring covering the tagged span.

use crate::context::NluContext;
use crate::encoder::EncodedTokens;
use crate::metadata::{tag_slot_name, IntentMeta, Metadata};
use crate::result::NluError;
use std::collections::HashMap;

/// Pick the intent with the highest posterior, returning the intent and the
/// raw posterior value as confidence.
pub fn decode_intent<'a>(
    metadata: &'a Metadata,
    output: &[f32],
) -> Result<(&'a IntentMeta, f32), NluError> {
    let count = metadata.intents.len();
    if output.len() < count {
        return Err(NluError::Inference(format!(
            "intent output holds {} values for {} intents",
            output.len(),
            count
        )));
    }
    let index = arg_max(&output[..count]);
    Ok((&metadata.intents[index], output[index]))
}

/// Decode BIO-tagged slot spans into raw substrings of the utterance.
///
/// The walk preserves the reference behavior exactly: `o` clears the open
/// span; a `b_` label always starts a fresh span, even directly after
/// another `b_`/`i_`; any other non-`o` label extends the open span
/// regardless of its slot name. Spans are collected in start order, so a
/// later span deterministically replaces an earlier one of the same name.
pub fn decode_slots(
    context: &NluContext,
    metadata: &Metadata,
    encoded: &EncodedTokens,
    output: &[f32],
) -> Result<HashMap<String, String>, NluError> {
    let labels = tag_labels(metadata, encoded.len(), output)?;
    context.trace_debug(&format!("Tag labels: {:?}", labels));

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut open = false;
    for (i, label) in labels.iter().enumerate() {
        if *label == "o" {
            open = false;
        } else if label.starts_with("b_") {
            spans.push((i, i + 1));
            open = true;
        } else if open {
            if let Some(span) = spans.last_mut() {
                span.1 = i + 1;
            }
        }
    }

    let mut slots = HashMap::new();
    for (start, end) in spans {
        let value = encoded
            .decode_range(start, end)
            .map_err(|e| NluError::Encoding(e.to_string()))?;
        slots.insert(tag_slot_name(labels[start]).to_string(), value);
    }
    Ok(slots)
}

/// Arg-max tag label for each encoded token, bounded by the token count
/// rather than the full output buffer.
fn tag_labels<'a>(
    metadata: &'a Metadata,
    num_tokens: usize,
    output: &[f32],
) -> Result<Vec<&'a str>, NluError> {
    let num_tags = metadata.tags.len();
    if num_tags == 0 || output.len() < num_tokens * num_tags {
        return Err(NluError::Inference(format!(
            "tag output holds {} values for {} tokens x {} tags",
            output.len(),
            num_tokens,
            num_tags
        )));
    }
    let mut labels = Vec::with_capacity(num_tokens);
    for i in 0..num_tokens {
        let posteriors = &output[i * num_tags..(i + 1) * num_tags];
        labels.push(metadata.tags[arg_max(posteriors)].as_str());
    }
    Ok(labels)
}

/// Index of the largest value; the first occurrence wins ties.
pub fn arg_max(values: &[f32]) -> usize {
    let mut max_index = 0;
    let mut max_value = f32::NEG_INFINITY;
    for (i, &value) in values.iter().enumerate() {
        if value > max_value {
            max_index = i;
            max_value = value;
        }
    }
    max_index
}
