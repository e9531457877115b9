//! Route naming for imported features.

use camino::Utf8Path;
use serde_json::{Map, Value};

/// Property keys consulted for a feature's name, in priority order.
const NAME_KEYS: [&str; 2] = ["Name", "name"];

/// Name shared by every segment of a feature.
///
/// Uses the first non-blank `Name` or `name` property, else a default built
/// from the file stem and the 1-based feature index.
pub(crate) fn base_name(
    properties: Option<&Map<String, Value>>,
    file: &Utf8Path,
    feature: usize,
) -> String {
    properties
        .and_then(|props| {
            NAME_KEYS
                .iter()
                .filter_map(|key| props.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .find(|name| !name.is_empty())
        })
        .map_or_else(|| default_name(file, feature), str::to_owned)
}

fn default_name(file: &Utf8Path, feature: usize) -> String {
    let stem = file.file_stem().unwrap_or_default().replace('_', " ");
    format!("{} Feature {feature}", title_case(&stem))
}

/// Capitalise the first letter of every run of letters and lowercase the
/// rest.
pub(crate) fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if in_word {
            titled.extend(ch.to_lowercase());
        } else {
            titled.extend(ch.to_uppercase());
        }
        in_word = ch.is_alphabetic();
    }
    titled
}

/// Final route name for one segment.
///
/// Multi-segment features get a `(Segment n)` suffix so each part keeps its
/// own upsert key.
pub(crate) fn segment_name(base: &str, segment: usize, segments: usize) -> String {
    if segments > 1 {
        format!("{base} (Segment {segment})")
    } else {
        base.to_owned()
    }
}
