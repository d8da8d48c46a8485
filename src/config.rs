use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::labels::{NUM_CLASSES, NUM_KEYPOINTS};

/// Channels holding `cx, cy, w, h`.
pub const BOX_CHANNELS: usize = 4;
/// Channels per keypoint: `x, y, confidence`.
pub const KEYPOINT_STRIDE: usize = 3;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Detection,
    Pose,
}

/// How the frame was mapped onto the network input.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Each axis scaled independently.
    Stretch,
    /// Aspect preserved, equal padding on both sides of the short axis.
    Letterbox,
}

/// Geometry of the network the raw output belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelSpec {
    pub input_width: u32,
    pub input_height: u32,
    pub objectness: bool,
    pub fit: Fit,
}

impl ModelSpec {
    pub fn new(input_width: u32, input_height: u32) -> Self {
        Self {
            input_width,
            input_height,
            objectness: false,
            fit: Fit::Stretch,
        }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    pub fn with_objectness(mut self, objectness: bool) -> Self {
        self.objectness = objectness;
        self
    }

    pub fn with_fit(mut self, fit: Fit) -> Self {
        self.fit = fit;
        self
    }

    /// Feature channels per anchor for the given mode.
    pub fn features(&self, mode: Mode) -> usize {
        match mode {
            Mode::Detection => BOX_CHANNELS + self.objectness as usize + NUM_CLASSES,
            Mode::Pose => BOX_CHANNELS + 1 + NUM_KEYPOINTS * KEYPOINT_STRIDE,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(Error::Config(format!(
                "network input size must be positive, got {}x{}",
                self.input_width, self.input_height
            )));
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_trail_length: usize,
    pub movement_threshold: f32,
    pub max_match_distance: f32,
    pub mode: Mode,
}

impl Config {
    pub fn from_json(src: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        unit_interval("confidenceThreshold", self.confidence_threshold)?;
        unit_interval("iouThreshold", self.iou_threshold)?;

        if self.max_trail_length < 1 {
            return Err(Error::Config("maxTrailLength must be at least 1".into()));
        }

        if !self.movement_threshold.is_finite() || self.movement_threshold < 0.0 {
            return Err(Error::Config(format!(
                "movementThreshold must be a non-negative number, got {}",
                self.movement_threshold
            )));
        }

        if self.max_match_distance.is_nan() || self.max_match_distance < 0.0 {
            return Err(Error::Config(format!(
                "maxMatchDistance must be non-negative, got {}",
                self.max_match_distance
            )));
        }

        Ok(())
    }
}

fn unit_interval(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_trail_length: 30,
            movement_threshold: 2.0,
            max_match_distance: 100.0,
            mode: Mode::Pose,
        }
    }

    #[test]
    fn accepts_reference_values() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let mut c = config();
        c.confidence_threshold = 1.5;
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = config();
        c.iou_threshold = -0.1;
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = config();
        c.iou_threshold = f32::NAN;
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = config();
        c.max_trail_length = 0;
        assert!(matches!(c.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn parses_json() {
        let c = Config::from_json(
            r#"{
                "confidenceThreshold": 0.25,
                "iouThreshold": 0.45,
                "maxTrailLength": 30,
                "movementThreshold": 2.0,
                "maxMatchDistance": 100.0,
                "mode": "pose"
            }"#,
        )
        .unwrap();
        assert_eq!(c, config());
    }

    #[test]
    fn json_requires_every_field() {
        let res = Config::from_json(r#"{ "confidenceThreshold": 0.25, "mode": "pose" }"#);
        assert!(matches!(res, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn json_is_validated() {
        let res = Config::from_json(
            r#"{
                "confidenceThreshold": 0.25,
                "iouThreshold": 2.0,
                "maxTrailLength": 30,
                "movementThreshold": 2.0,
                "maxMatchDistance": 100.0,
                "mode": "detection"
            }"#,
        );
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn model_spec_json_uses_camel_case() {
        let model: ModelSpec = serde_json::from_str(
            r#"{ "inputWidth": 640, "inputHeight": 384, "objectness": true, "fit": "letterbox" }"#,
        )
        .unwrap();
        assert_eq!(
            model,
            ModelSpec::new(640, 384)
                .with_objectness(true)
                .with_fit(Fit::Letterbox)
        );

        let snake = serde_json::from_str::<ModelSpec>(
            r#"{ "input_width": 640, "input_height": 384, "objectness": true, "fit": "letterbox" }"#,
        );
        assert!(snake.is_err());

        let extra = serde_json::from_str::<ModelSpec>(
            r#"{ "inputWidth": 640, "inputHeight": 384, "objectness": true, "fit": "stretch", "classes": 80 }"#,
        );
        assert!(extra.is_err());
    }

    #[test]
    fn feature_counts() {
        let model = ModelSpec::square(640);
        assert_eq!(model.features(Mode::Detection), 84);
        assert_eq!(model.with_objectness(true).features(Mode::Detection), 85);
        assert_eq!(model.features(Mode::Pose), 56);
    }
}
