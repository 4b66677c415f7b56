//! Categorical color assignment.
//!
//! Maps the distinct values of a categorical column to a cyclic sequence of
//! color tokens. Assignment is deterministic regardless of row order:
//! distinct non-missing values are deduplicated and sorted (numerically when
//! the column is homogeneous numeric, by string form otherwise) before
//! receiving `palette[i % len]`.
//!
//! Built-in palettes carry 12 tokens each; a custom palette takes 6 to 12
//! hex colors and falls back to `classic` when the input does not validate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{RecordSet, Value};

/// Token returned for missing or unmapped values.
pub const DEFAULT_COLOR: &str = "bar-gray";

const CLASSIC: [&str; 12] = [
    "bar-blue", "bar-green", "bar-orange", "bar-purple", "bar-red", "bar-teal", "bar-pink",
    "bar-indigo", "bar-cyan", "bar-amber", "bar-lime", "bar-gray",
];

const PASTEL: [&str; 12] = [
    "bar-pastel-blue", "bar-pastel-green", "bar-pastel-orange", "bar-pastel-purple",
    "bar-pastel-red", "bar-pastel-teal", "bar-pastel-pink", "bar-pastel-indigo",
    "bar-pastel-cyan", "bar-pastel-amber", "bar-pastel-lime", "bar-pastel-gray",
];

const DARK: [&str; 12] = [
    "bar-dark-blue", "bar-dark-green", "bar-dark-orange", "bar-dark-purple", "bar-dark-red",
    "bar-dark-teal", "bar-dark-pink", "bar-dark-indigo", "bar-dark-cyan", "bar-dark-amber",
    "bar-dark-lime", "bar-dark-gray",
];

const DATAIKU: [&str; 12] = [
    "bar-dataiku-1", "bar-dataiku-2", "bar-dataiku-3", "bar-dataiku-4", "bar-dataiku-5",
    "bar-dataiku-6", "bar-dataiku-7", "bar-dataiku-8", "bar-dataiku-9", "bar-dataiku-10",
    "bar-dataiku-11", "bar-dataiku-12",
];

/// Minimum number of colors a custom palette must provide.
pub const CUSTOM_MIN_COLORS: usize = 6;
/// Maximum number of colors a custom palette may provide; extras are dropped.
pub const CUSTOM_MAX_COLORS: usize = 12;

/// Which palette drives categorical colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteName {
    /// Default 12-color palette.
    #[default]
    Classic,
    /// Muted variant.
    Pastel,
    /// High-contrast variant for dark backgrounds.
    Dark,
    /// Product-branded variant.
    Dataiku,
    /// Caller-supplied hex colors.
    Custom,
}

/// Categorical value → color token, keyed by the value's string form.
pub type ColorMapping = BTreeMap<String, String>;

/// Resolves a palette name to its token sequence.
///
/// `Custom` validates the supplied colors and falls back to `classic` when
/// they are absent, under-sized, or malformed.
pub fn resolve_palette(name: PaletteName, custom_colors: Option<&[String]>) -> Vec<String> {
    let builtin = |p: &[&str; 12]| p.iter().map(|s| s.to_string()).collect();
    match name {
        PaletteName::Classic => builtin(&CLASSIC),
        PaletteName::Pastel => builtin(&PASTEL),
        PaletteName::Dark => builtin(&DARK),
        PaletteName::Dataiku => builtin(&DATAIKU),
        PaletteName::Custom => match custom_colors.and_then(validate_custom_colors) {
            Some(colors) => colors,
            None => {
                warn!("custom palette invalid or under-sized, falling back to classic");
                builtin(&CLASSIC)
            }
        },
    }
}

/// Validates and normalizes a custom color list.
///
/// Each entry must be a 3- or 6-digit hex string (leading `#` optional);
/// 3-digit forms expand by digit duplication. Requires at least
/// [`CUSTOM_MIN_COLORS`] entries and keeps at most [`CUSTOM_MAX_COLORS`].
pub fn validate_custom_colors(colors: &[String]) -> Option<Vec<String>> {
    if colors.len() < CUSTOM_MIN_COLORS {
        return None;
    }
    colors
        .iter()
        .take(CUSTOM_MAX_COLORS)
        .map(|c| normalize_hex_color(c))
        .collect()
}

fn normalize_hex_color(color: &str) -> Option<String> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        6 => Some(format!("#{}", digits.to_ascii_lowercase())),
        3 => {
            let mut expanded = String::with_capacity(6);
            for c in digits.chars() {
                let c = c.to_ascii_lowercase();
                expanded.push(c);
                expanded.push(c);
            }
            Some(format!("#{expanded}"))
        }
        _ => None,
    }
}

/// Builds the categorical value → token mapping for one column.
///
/// Returns an empty mapping when the column is absent or holds only missing
/// values. The i-th sorted distinct value receives `palette[i % len]`,
/// cycling when more values than tokens exist.
pub fn create_color_mapping(
    records: &RecordSet,
    column: &str,
    palette_name: PaletteName,
    custom_colors: Option<&[String]>,
) -> ColorMapping {
    if !records.contains_column(column) {
        warn!(column, "color column not found in input schema");
        return ColorMapping::new();
    }

    // Deduplicate by string form, remembering one representative value so a
    // homogeneous numeric column can sort numerically.
    let mut seen: Vec<(String, Option<f64>)> = Vec::new();
    for value in records.column_values(column) {
        if value.is_missing() {
            continue;
        }
        let key = value.display_string();
        if seen.iter().any(|(k, _)| *k == key) {
            continue;
        }
        seen.push((key, value.as_number()));
    }

    let all_numeric = !seen.is_empty() && seen.iter().all(|(_, n)| n.is_some());
    if all_numeric {
        seen.sort_by(|a, b| a.1.unwrap().total_cmp(&b.1.unwrap()));
    } else {
        seen.sort_by(|a, b| a.0.cmp(&b.0));
    }

    let palette = resolve_palette(palette_name, custom_colors);
    let mapping: ColorMapping = seen
        .into_iter()
        .enumerate()
        .map(|(i, (key, _))| (key, palette[i % palette.len()].clone()))
        .collect();

    info!(
        column,
        categories = mapping.len(),
        "created color mapping"
    );
    mapping
}

/// Looks up the token for one value; missing and unmapped values get the
/// designated default.
pub fn color_class<'a>(value: &Value, mapping: &'a ColorMapping) -> &'a str {
    if value.is_missing() {
        return DEFAULT_COLOR;
    }
    mapping
        .get(&value.display_string())
        .map(String::as_str)
        .unwrap_or(DEFAULT_COLOR)
}

/// Aggregate view of a mapping, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSummary {
    /// Distinct categorical values mapped.
    pub total_categories: usize,
    /// Distinct tokens actually used.
    pub unique_colors: usize,
    /// How many times the palette wraps to cover all categories.
    pub palette_cycles: usize,
}

/// Summarizes a mapping against a palette of `palette_len` tokens.
pub fn mapping_summary(mapping: &ColorMapping, palette_len: usize) -> MappingSummary {
    let mut colors: Vec<&str> = mapping.values().map(String::as_str).collect();
    colors.sort_unstable();
    colors.dedup();
    MappingSummary {
        total_categories: mapping.len(),
        unique_colors: colors.len(),
        palette_cycles: mapping.len().div_ceil(palette_len.max(1)),
    }
}
