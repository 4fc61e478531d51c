//! Integration tests for the extraction API

use std::fs;

use image::{Rgba, RgbaImage};

use regionkit::providers::{
    CloudDetection, CloudDetectionKind, CloudVisionAnalyzer, RecordedCompletionProvider,
};
use regionkit::raster::codec::encode_png;
use regionkit::{ExtractionConfig, ExtractionMode, ExtractionRequest, RegionKit, RegionResult, RegionSource};

/// 400x300 white page with a 100x60 red block at (50, 50)
fn single_block_png() -> Vec<u8> {
    let mut image = RgbaImage::from_pixel(400, 300, Rgba([255, 255, 255, 255]));
    for y in 50..110 {
        for x in 50..150 {
            image.put_pixel(x, y, Rgba([220, 20, 20, 255]));
        }
    }
    encode_png(&image).unwrap()
}

fn uniform_png(width: u32, height: u32) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255]))).unwrap()
}

struct StaticAnalyzer;

impl CloudVisionAnalyzer for StaticAnalyzer {
    fn analyze(&self, _image_bytes: &[u8]) -> RegionResult<Vec<CloudDetection>> {
        Ok(vec![
            CloudDetection {
                kind: CloudDetectionKind::Object,
                label: "block".to_string(),
                confidence: 0.9,
                x: 300,
                y: 200,
                width: 2,
                height: 2,
            },
        ])
    }
}

#[test]
fn test_contour_extraction_end_to_end() {
    let kit = RegionKit::new(ExtractionConfig::default());
    let mode = ExtractionMode::from_name("contour", kit.config()).unwrap();
    let response = kit.extract(&ExtractionRequest::new(single_block_png(), mode));

    assert!(response.success);
    assert_eq!(response.total_found, 1);
    assert_eq!(response.summary, "Extracted 1 region(s) using contour");

    let image = &response.images[0];
    assert_eq!((image.width, image.height), (104, 64));
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(&image.png_data[..4], &[0x89, b'P', b'N', b'G']);
    assert_eq!(image.region.bbox.x, 50);
    assert!(image.to_data_url().starts_with("data:image/png;base64,"));
}

#[test]
fn test_decode_failure_is_reported() {
    let kit = RegionKit::new(ExtractionConfig::default());
    let response = kit.extract(&ExtractionRequest::new(b"definitely not an image".to_vec(),
                                                       ExtractionMode::Sections));

    assert!(!response.success);
    assert!(response.error.is_some());
    assert_eq!(response.total_found, 0);
    assert!(response.images.is_empty());
}

#[test]
fn test_uniform_image_is_not_an_error() {
    let kit = RegionKit::new(ExtractionConfig::default());
    let mode = ExtractionMode::Contour { min_size: 20, color_threshold: 25 };
    let response = kit.extract(&ExtractionRequest::new(uniform_png(64, 64), mode));

    assert!(response.success);
    assert_eq!(response.total_found, 0);
    assert_eq!(response.summary, "No regions found using contour");
}

#[test]
fn test_grid_extraction_names_cells() {
    let kit = RegionKit::new(ExtractionConfig::default());
    let request = ExtractionRequest::new(uniform_png(80, 60), ExtractionMode::Grid { rows: 2, columns: 2 })
        .with_mime_type("image/png");
    let response = kit.extract(&request);

    assert!(response.success);
    assert_eq!(response.total_found, 4);
    let names: Vec<&str> = response.images.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, vec!["grid_r1_c1.png", "grid_r1_c2.png", "grid_r2_c1.png", "grid_r2_c2.png"]);
}

#[test]
fn test_invalid_grid_fails_request() {
    let kit = RegionKit::new(ExtractionConfig::default());
    let response = kit.extract(&ExtractionRequest::new(uniform_png(10, 10),
                                                       ExtractionMode::Grid { rows: 5, columns: 5 }));

    assert!(!response.success);
    assert!(response.error.unwrap().contains("grid"));
}

#[test]
fn test_hybrid_fusion_keeps_one_of_overlapping_boxes() {
    // The oracle box is shifted 20px right of the block: 80% overlap
    let answer = r#"[{"description": "shifted", "imageType": "card",
        "boundingBox": {"normalizedX": 0.175, "normalizedY": 0.1666667,
                        "normalizedWidth": 0.25, "normalizedHeight": 0.2}, "confidence": 0.9}]"#;
    let mut config = ExtractionConfig::default();
    config.refine_ai_regions = false;
    let kit = RegionKit::new(config)
        .with_vision_provider(Box::new(RecordedCompletionProvider::new(answer)));

    let response = kit.extract(&ExtractionRequest::new(single_block_png(), ExtractionMode::Hybrid));

    assert!(response.success);
    assert_eq!(response.total_found, 1);
    let region = &response.images[0].region;
    assert_eq!(region.source, RegionSource::Ai);
    assert_eq!((region.bbox.x, region.bbox.y), (70, 50));
}

#[test]
fn test_hybrid_without_oracle_uses_pixel_detectors() {
    let kit = RegionKit::new(ExtractionConfig::default())
        .with_cloud_analyzer(Box::new(StaticAnalyzer));
    let response = kit.extract(&ExtractionRequest::new(single_block_png(), ExtractionMode::Hybrid));

    assert!(response.success);
    assert_eq!(response.total_found, 1);
    assert_eq!(response.images[0].region.source, RegionSource::Card);
    assert!(response.summary.contains("AI oracle not configured"));
}

#[test]
fn test_unparsable_oracle_answer_yields_no_regions() {
    let kit = RegionKit::new(ExtractionConfig::default())
        .with_vision_provider(Box::new(RecordedCompletionProvider::new("I could not find anything.")));
    let response = kit.extract(&ExtractionRequest::new(single_block_png(), ExtractionMode::AiRegions));

    assert!(response.success);
    assert_eq!(response.total_found, 0);
}

#[test]
fn test_response_serializes_without_pixels() {
    let kit = RegionKit::new(ExtractionConfig::default());
    let response = kit.extract(&ExtractionRequest::new(single_block_png(),
                                                       ExtractionMode::UiCards { min_size: 40 }));
    let json = response.to_json().unwrap();

    assert!(json.contains("\"totalFound\": 1"));
    assert!(json.contains("\"boundingBox\""));
    assert!(json.contains("\"mimeType\": \"image/png\""));
    assert!(json.contains("\"source\": \"card\""));
    assert!(!json.contains("png_data"));
    assert!(!json.contains("\"error\""));
}

#[test]
fn test_extract_file_and_region_log() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.png");
    let log = dir.path().join("regions.log");
    fs::write(&input, single_block_png()).unwrap();

    let kit = RegionKit::new(ExtractionConfig::default())
        .with_log_file(log.to_str().unwrap())
        .unwrap();
    let response = kit
        .extract_file(input.to_str().unwrap(), ExtractionMode::FloodFill { min_size: 30, tolerance: 15 })
        .unwrap();

    assert!(response.success);
    assert_eq!(response.total_found, 1);
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("Regions found using floodfill (1 region(s))"));
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("regionkit.toml");
    fs::write(&path, "[grid]\nrows = 3\ncolumns = 1\n\n[crop]\npadding = 0\n").unwrap();

    let config = ExtractionConfig::from_file(path.to_str().unwrap()).unwrap();
    let kit = RegionKit::new(config);
    let mode = ExtractionMode::from_name("grid", kit.config()).unwrap();
    let response = kit.extract(&ExtractionRequest::new(uniform_png(30, 90), mode));

    assert_eq!(response.total_found, 3);
    assert!(response.images.iter().all(|i| (i.width, i.height) == (30, 30)));
}
