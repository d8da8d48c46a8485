use trailtrack::bbox::BBox;
use trailtrack::nms::non_maximum_suppression;
use trailtrack::{
    Config, Decoder, Detection, Direction, Error, Mode, ModelSpec, Pipeline, RawOutput, Tracker,
};

const FEATURES: usize = 84;

/// Planar `[1, 84, n]` detection buffer, one `(cx, cy, w, h, class, score)` per anchor.
fn detection_buffer(anchors: &[(f32, f32, f32, f32, usize, f32)]) -> Vec<f32> {
    let n = anchors.len();
    let mut data = vec![0.0; FEATURES * n];

    for (i, &(cx, cy, w, h, class, score)) in anchors.iter().enumerate() {
        data[i] = cx;
        data[n + i] = cy;
        data[2 * n + i] = w;
        data[3 * n + i] = h;
        data[(4 + class) * n + i] = score;
    }

    data
}

fn config(mode: Mode) -> Config {
    Config {
        confidence_threshold: 0.5,
        iou_threshold: 0.45,
        max_trail_length: 30,
        movement_threshold: 2.0,
        max_match_distance: 100.0,
        mode,
    }
}

#[test]
fn weak_anchor_is_filtered_then_overlap_is_suppressed() {
    let data = detection_buffer(&[
        (110.0, 110.0, 20.0, 20.0, 0, 0.9),
        (110.0, 110.0, 20.0, 20.0, 0, 0.3),
    ]);
    let decoder = Decoder::new(Mode::Detection, ModelSpec::square(640), 0.5);
    let dets = decoder
        .decode(&RawOutput::new(&data, &[1, FEATURES, 2]), 640, 640)
        .unwrap();

    assert_eq!(dets.len(), 1);
    assert_eq!(dets[0].score, 0.9);
    assert_eq!(dets[0].bbox.as_slice(), &[100.0, 100.0, 20.0, 20.0]);

    let candidates = vec![
        Detection::object(BBox::ltwh(100.0, 100.0, 20.0, 20.0), 0.9, 0),
        Detection::object(BBox::ltwh(102.0, 101.0, 20.0, 20.0), 0.85, 0),
    ];
    let kept = non_maximum_suppression(candidates, 0.45);

    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].score, 0.9);
}

#[test]
fn identity_survives_a_small_move() {
    let mut tracker = Tracker::new(100.0, 30);

    let at = |cx: f32, cy: f32| Detection::object(BBox::xywh(cx, cy, 10.0, 10.0).as_ltwh(), 0.9, 0);

    let out = tracker.update(vec![at(50.0, 50.0)]);
    assert_eq!(out[0].id, Some(0));

    let out = tracker.update(vec![at(52.0, 51.0)]);
    assert_eq!(out[0].id, Some(0));
    assert_eq!(tracker.table().get(0).unwrap().history().len(), 2);
}

#[test]
fn direction_threshold_boundary() {
    let mut pipeline = Pipeline::new(config(Mode::Detection), ModelSpec::square(640), 640, 640).unwrap();

    let step = |p: &mut Pipeline, cx: f32| {
        let data = detection_buffer(&[(cx, 300.0, 40.0, 40.0, 2, 0.9)]);
        p.process_frame(&RawOutput::new(&data, &[1, FEATURES, 1]))
            .unwrap()
    };

    step(&mut pipeline, 100.0);
    let frame = step(&mut pipeline, 102.0);
    assert_eq!(frame.objects[0].direction, Direction::Still);

    pipeline.reset();
    step(&mut pipeline, 100.0);
    let frame = step(&mut pipeline, 102.5);
    assert_eq!(frame.objects[0].direction, Direction::Right);
    assert_eq!(frame.objects[0].detection.label(), "car");
}

#[test]
fn full_pipeline_over_a_short_clip() {
    let mut pipeline = Pipeline::new(config(Mode::Detection), ModelSpec::square(640), 1280, 640).unwrap();

    // two objects walking apart, plus a duplicate box on the first one
    for i in 0..6 {
        let t = i as f32 * 5.0;
        let data = detection_buffer(&[
            (200.0 - t, 300.0, 50.0, 100.0, 0, 0.9),
            (201.0 - t, 301.0, 50.0, 100.0, 0, 0.8),
            (400.0 + t, 300.0, 50.0, 100.0, 0, 0.7),
        ]);

        let frame = pipeline
            .process_frame(&RawOutput::new(&data, &[1, FEATURES, 3]))
            .unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.identities, 2);
        assert_eq!(frame.objects[0].id, 0);
        assert_eq!(frame.objects[1].id, 1);
    }

    let frame = pipeline
        .process_frame(&RawOutput::new(&[], &[1, FEATURES, 0]))
        .unwrap();
    assert!(frame.is_empty());
    assert!(pipeline.tracks().is_empty());
}

#[test]
fn direction_labels_reach_the_output() {
    let mut pipeline = Pipeline::new(config(Mode::Detection), ModelSpec::square(640), 640, 640).unwrap();
    let mut last = None;

    for i in 0..6 {
        let data = detection_buffer(&[(300.0, 300.0 - 10.0 * i as f32, 40.0, 40.0, 0, 0.9)]);
        last = Some(
            pipeline
                .process_frame(&RawOutput::new(&data, &[1, FEATURES, 1]))
                .unwrap(),
        );
    }

    let frame = last.unwrap();
    assert_eq!(frame.objects[0].direction, Direction::Up);
    assert_eq!(frame.objects[0].direction.to_string(), "moving up");
}

#[test]
fn config_errors_fail_fast() {
    let mut c = config(Mode::Pose);
    c.confidence_threshold = -0.1;

    let err = Pipeline::new(c, ModelSpec::square(320), 640, 480).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
