/*!
 * Segment codec.
 *
 * A batch travels to the model as one payload with segments joined by
 * [`SEPARATOR`]. The response is split back on the same marker and forced
 * to the length of the request: missing trailing segments fall back to the
 * original texts and surplus segments are dropped.
 *
 * Separators occurring inside a segment are not escaped, so such a text
 * shifts every later segment of its batch.
 */

use log::warn;

use crate::errors::TranslationError;

/// Marker placed between segments of a payload
pub const SEPARATOR: &str = "¦¦¦";

/// Join texts into a single delimited payload
pub fn encode<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .map(|text| text.as_ref())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Split a response into exactly `expected` segments
///
/// Returns the aligned segments and, when the raw count differed, the
/// mismatch that was repaired.
pub fn reconcile<S: AsRef<str>>(
    response: &str,
    expected: usize,
    originals: &[S],
) -> (Vec<String>, Option<TranslationError>) {
    let mut parts: Vec<String> = response.split(SEPARATOR).map(str::to_string).collect();
    let received = parts.len();

    if received == expected {
        return (parts, None);
    }

    if received < expected {
        for index in received..expected {
            let fallback = originals
                .get(index)
                .map(|original| original.as_ref().to_string())
                .unwrap_or_default();
            parts.push(fallback);
        }
    } else {
        parts.truncate(expected);
    }

    (parts, Some(TranslationError::SegmentCountMismatch { expected, received }))
}

/// Split a response into exactly `expected` segments, logging any repair
pub fn decode<S: AsRef<str>>(response: &str, expected: usize, originals: &[S]) -> Vec<String> {
    let (parts, mismatch) = reconcile(response, expected, originals);
    if let Some(mismatch) = mismatch {
        warn!("{}", mismatch);
    }
    parts
}
