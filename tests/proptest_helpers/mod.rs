#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use trailtrack::bbox::{BBox, Ltwh};
use trailtrack::Detection;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(128);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_bbox() -> impl Strategy<Value = BBox<Ltwh>> {
    (0.0f32..500.0, 0.0f32..500.0, 1.0f32..120.0, 1.0f32..120.0)
        .prop_map(|(x, y, w, h)| BBox::ltwh(x, y, w, h))
}

pub fn arb_detection() -> impl Strategy<Value = Detection> {
    (arb_bbox(), 0.0f32..=1.0, 0usize..80)
        .prop_map(|(bbox, score, class_id)| Detection::object(bbox, score, class_id))
}

pub fn arb_detections(max: usize) -> impl Strategy<Value = Vec<Detection>> {
    prop::collection::vec(arb_detection(), 0..=max)
}

/// Detection whose box is centred on `(cx, cy)`.
pub fn detection_at(cx: f32, cy: f32) -> Detection {
    Detection::object(BBox::xywh(cx, cy, 20.0, 20.0).as_ltwh(), 0.9, 0)
}
