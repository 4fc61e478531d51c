//! AI oracle region parsing
//!
//! The oracle answers in loosely structured text: a JSON array, sometimes
//! wrapped in a markdown fence, sometimes with trailing commas or a single
//! bare object. Parsing is tolerant. Whatever cannot be read becomes zero
//! regions, never an error.

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::coordinate::BoundingBox;
use crate::errors::{RegionError, RegionResult};
use crate::providers::{VisionCompletionProvider, REGION_PROMPT, REGION_SYSTEM_PROMPT};
use crate::raster::PixelBuffer;

use super::detector_strategy::DetectorStrategy;
use super::region::{DetectedRegion, RegionSource};

/// Pixels an oracle box may overhang the image before it is rejected
const OVERHANG_SLACK: u32 = 10;

/// Confidence assumed when the oracle does not report one
const DEFAULT_ORACLE_CONFIDENCE: f64 = 0.5;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```")
        .expect("valid code fence pattern");
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([\]}])")
        .expect("valid trailing comma pattern");
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleBoundingBox {
    #[serde(alias = "x")]
    normalized_x: f64,
    #[serde(alias = "y")]
    normalized_y: f64,
    #[serde(alias = "width")]
    normalized_width: f64,
    #[serde(alias = "height")]
    normalized_height: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleRegion {
    description: Option<String>,
    image_type: Option<String>,
    bounding_box: Option<OracleBoundingBox>,
    confidence: Option<f64>,
    suggested_filename: Option<String>,
}

/// The part of an answer that should hold JSON: a fenced block if present
fn answer_body(text: &str) -> &str {
    CODE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
}

fn strip_trailing_commas(json: &str) -> String {
    TRAILING_COMMA.replace_all(json, "$1").into_owned()
}

/// Pull the JSON array text out of an answer body
///
/// A body opening with `{` is a bare object and gets wrapped into a
/// one-element array even when its strings contain brackets. Otherwise the
/// outermost `[...]` is taken.
fn extract_json_array(content: &str) -> Option<String> {
    let slice = if content.starts_with('{') {
        let end = content.rfind('}')?;
        format!("[{}]", &content[..=end])
    } else {
        match (content.find('['), content.rfind(']')) {
            (Some(start), Some(end)) if start < end => content[start..=end].to_string(),
            _ => match (content.find('{'), content.rfind('}')) {
                (Some(start), Some(end)) if start < end => format!("[{}]", &content[start..=end]),
                _ => return None,
            },
        }
    };

    Some(strip_trailing_commas(&slice))
}

/// Objects found anywhere in the body, for answers whose brackets belong to prose
fn recover_objects(content: &str) -> Vec<Value> {
    let cleaned = strip_trailing_commas(content);
    split_top_level_objects(&cleaned)
        .into_iter()
        .filter_map(|object| serde_json::from_str::<Value>(object).ok())
        .collect()
}

/// Split text into its top-level `{...}` objects
///
/// Brace depth is tracked outside of string literals only, so braces inside
/// descriptions do not confuse the split.
fn split_top_level_objects(text: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    objects.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    objects
}

/// Parse the array, falling back to object-by-object recovery
fn parse_candidates(json: &str) -> Vec<Value> {
    match serde_json::from_str::<Vec<Value>>(json) {
        Ok(values) => values,
        Err(e) => {
            debug!("Oracle answer is not a clean JSON array ({}), recovering objects", e);
            split_top_level_objects(json)
                .into_iter()
                .filter_map(|object| serde_json::from_str::<Value>(object).ok())
                .collect()
        }
    }
}

/// Validate one oracle record and convert it to pixel space
fn to_region(record: OracleRegion, image_width: u32, image_height: u32) -> Option<DetectedRegion> {
    let b = record.bounding_box?;
    let values = [b.normalized_x, b.normalized_y, b.normalized_width, b.normalized_height];
    if values.iter().any(|v| !v.is_finite()) || b.normalized_width <= 0.0 || b.normalized_height <= 0.0 {
        return None;
    }

    let nx = b.normalized_x.clamp(0.0, 1.0);
    let ny = b.normalized_y.clamp(0.0, 1.0);
    let nw = b.normalized_width.min(1.0 - nx);
    let nh = b.normalized_height.min(1.0 - ny);
    if nw <= 0.0 || nh <= 0.0 {
        return None;
    }

    let bbox = BoundingBox::from_normalized(nx, ny, nw, nh, image_width, image_height);
    if !bbox.fits_within(image_width, image_height, OVERHANG_SLACK) || !bbox.is_valid() {
        return None;
    }

    let mut region = DetectedRegion::new(bbox, RegionSource::Ai,
                                         record.confidence.unwrap_or(DEFAULT_ORACLE_CONFIDENCE))
        .with_description(record.description.unwrap_or_default())
        .with_shape(record.image_type.unwrap_or_else(|| "region".to_string()));
    if let Some(name) = record.suggested_filename.filter(|n| !n.trim().is_empty()) {
        region = region.with_suggested_filename(name);
    }
    Some(region)
}

/// Parse an oracle answer into validated regions
///
/// # Arguments
/// * `text` - The oracle's free-text answer
/// * `image_width` - Width of the analyzed image
/// * `image_height` - Height of the analyzed image
///
/// # Returns
/// The regions that survived validation, possibly none
pub fn parse_oracle_regions(text: &str, image_width: u32, image_height: u32) -> Vec<DetectedRegion> {
    let body = answer_body(text);
    let mut candidates = extract_json_array(body)
        .map(|json| parse_candidates(&json))
        .unwrap_or_default();
    if !candidates.iter().any(Value::is_object) {
        candidates = recover_objects(body);
    }
    if candidates.is_empty() {
        warn!("Oracle answer contains no JSON objects, ignoring it");
        return Vec::new();
    }

    let total = candidates.len();
    let regions: Vec<DetectedRegion> = candidates
        .into_iter()
        .filter_map(|value| serde_json::from_value::<OracleRegion>(value).ok())
        .filter_map(|record| to_region(record, image_width, image_height))
        .collect();

    debug!("Oracle answer held {} record(s), {} valid", total, regions.len());
    regions
}

/// Strategy that asks the vision oracle for regions
pub struct AiRegionStrategy<'a> {
    provider: &'a dyn VisionCompletionProvider,
    image_bytes: &'a [u8],
    mime_type: &'a str,
}

impl<'a> AiRegionStrategy<'a> {
    pub fn new(provider: &'a dyn VisionCompletionProvider, image_bytes: &'a [u8], mime_type: &'a str) -> Self {
        AiRegionStrategy { provider, image_bytes, mime_type }
    }
}

impl DetectorStrategy for AiRegionStrategy<'_> {
    fn name(&self) -> &'static str {
        "aiRegions"
    }

    /// Provider failures come back as `ProviderError` so the caller can
    /// report the oracle as unavailable.
    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>> {
        let answer = self.provider
            .complete(self.image_bytes, self.mime_type, REGION_PROMPT, Some(REGION_SYSTEM_PROMPT))
            .map_err(|e| match e {
                RegionError::ProviderError(msg) => RegionError::ProviderError(msg),
                other => RegionError::ProviderError(other.to_string()),
            })?;

        let regions: Vec<DetectedRegion> = parse_oracle_regions(&answer, buffer.width(), buffer.height())
            .into_iter()
            .map(|r| {
                let bbox = r.bbox.with_image_size(buffer.width(), buffer.height());
                DetectedRegion { bbox, ..r }
            })
            .collect();

        info!("AI oracle proposed {} region(s)", regions.len());
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixels(b: &BoundingBox) -> (u32, u32, u32, u32) {
        (b.x, b.y, b.width, b.height)
    }

    #[test]
    fn test_fenced_array_with_trailing_comma() {
        let text = "Here you go:\n```json\n[\n  {\"description\": \"Logo\", \"imageType\": \"icon\", \
                    \"boundingBox\": {\"normalizedX\": 0.1, \"normalizedY\": 0.1, \
                    \"normalizedWidth\": 0.2, \"normalizedHeight\": 0.2}, \"confidence\": 0.9, \
                    \"suggestedFilename\": \"logo\"},\n]\n```";
        let regions = parse_oracle_regions(text, 200, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(pixels(&regions[0].bbox), (20, 10, 40, 20));
        assert_eq!(regions[0].shape, "icon");
        assert_eq!(regions[0].suggested_filename.as_deref(), Some("logo"));
        assert_eq!(regions[0].source, RegionSource::Ai);
    }

    #[test]
    fn test_single_object_is_wrapped() {
        let text = r#"{"boundingBox": {"x": 0.5, "y": 0.5, "width": 0.25, "height": 0.25}}"#;
        let regions = parse_oracle_regions(text, 100, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(pixels(&regions[0].bbox), (50, 50, 25, 25));
        assert_eq!(regions[0].shape, "region");
        assert_eq!(regions[0].confidence, DEFAULT_ORACLE_CONFIDENCE);
    }

    #[test]
    fn test_bare_object_with_brackets_in_description() {
        let text = r#"{"description": "Submit [primary] button", "boundingBox": {"normalizedX": 0.1,
            "normalizedY": 0.1, "normalizedWidth": 0.3, "normalizedHeight": 0.3}}"#;
        let regions = parse_oracle_regions(text, 100, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].description, "Submit [primary] button");
        assert_eq!(pixels(&regions[0].bbox), (10, 10, 30, 30));
    }

    #[test]
    fn test_prose_brackets_before_object() {
        let text = "Found one element [see JSON]:\n{\"description\": \"Card\", \"boundingBox\": \
                    {\"normalizedX\": 0.2, \"normalizedY\": 0.2, \"normalizedWidth\": 0.5, \
                    \"normalizedHeight\": 0.4}}";
        let regions = parse_oracle_regions(text, 100, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].description, "Card");
        assert_eq!(pixels(&regions[0].bbox), (20, 20, 50, 40));
    }

    #[test]
    fn test_overhang_and_undersized_boxes_in_pixels() {
        // 0.95 + 0.1 overhangs a 200px image by 10px and is trimmed to fit
        let text = r#"[
            {"description": "edge", "boundingBox": {"normalizedX": 0.95, "normalizedY": 0.0,
                "normalizedWidth": 0.1, "normalizedHeight": 0.5}},
            {"description": "sliver", "boundingBox": {"normalizedX": 0.5, "normalizedY": 0.5,
                "normalizedWidth": 0.015, "normalizedHeight": 0.2}}
        ]"#;
        let regions = parse_oracle_regions(text, 200, 200);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].description, "edge");
        let b = &regions[0].bbox;
        assert_eq!(pixels(b), (190, 0, 10, 100));
        assert!(b.right() <= 200 && b.bottom() <= 200);
    }

    #[test]
    fn test_not_json_yields_nothing() {
        assert!(parse_oracle_regions("not json", 100, 100).is_empty());
        assert!(parse_oracle_regions("", 100, 100).is_empty());
    }

    #[test]
    fn test_invalid_boxes_are_rejected() {
        let text = r#"[
            {"boundingBox": {"normalizedX": 0.1, "normalizedY": 0.1, "normalizedWidth": 0, "normalizedHeight": 0.2}},
            {"boundingBox": {"normalizedX": 0.1, "normalizedY": 0.1, "normalizedWidth": 0.01, "normalizedHeight": 0.01}},
            {"boundingBox": {"normalizedX": 0.9, "normalizedY": 0.9, "normalizedWidth": 0.5, "normalizedHeight": 0.5}},
            {"description": "no box"}
        ]"#;
        let regions = parse_oracle_regions(text, 100, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(pixels(&regions[0].bbox), (90, 90, 10, 10));
    }

    #[test]
    fn test_broken_array_recovers_objects() {
        let text = r#"[
            {"description": "a {brace} in text", "boundingBox": {"normalizedX": 0, "normalizedY": 0, "normalizedWidth": 0.5, "normalizedHeight": 0.5}}
            {"description": "b", "boundingBox": {"normalizedX": 0.5, "normalizedY": 0.5, "normalizedWidth": 0.5, "normalizedHeight": 0.5}}
        ]"#;
        let regions = parse_oracle_regions(text, 100, 100);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].description, "a {brace} in text");
    }

    #[test]
    fn test_split_ignores_braces_in_strings() {
        let objects = split_top_level_objects(r#"[{"a": "}"}, {"b": {"c": 1}}]"#);
        assert_eq!(objects, vec![r#"{"a": "}"}"#, r#"{"b": {"c": 1}}"#]);
    }
}
