use crate::bbox::{BBox, Ltwh};
use crate::config::{Fit, Mode, ModelSpec, BOX_CHANNELS, KEYPOINT_STRIDE};
use crate::detection::{Detection, Keypoint};
use crate::error::{Error, Result};
use crate::labels::NUM_CLASSES;

use ndarray::prelude::*;
use tracing::debug;

/// Where the feature axis lives in the raw buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `[features, anchors]`: feature `f` of anchor `i` at `f * anchors + i`.
    Planar,
    /// `[anchors, features]`: one contiguous row per anchor.
    Interleaved,
}

/// Borrowed network output for one frame.
#[derive(Debug, Clone)]
pub struct RawOutput<'a> {
    data: &'a [f32],
    shape: Vec<usize>,
    layout: Option<Layout>,
}

impl<'a> RawOutput<'a> {
    /// Buffer with its reported dims; the layout is inferred from where the
    /// feature axis sits.
    pub fn new(data: &'a [f32], shape: &[usize]) -> Self {
        Self {
            data,
            shape: shape.to_vec(),
            layout: None,
        }
    }

    /// Bare planar buffer without dims, anchor count derived from its length.
    pub fn planar(data: &'a [f32]) -> Self {
        Self {
            data,
            shape: Vec::new(),
            layout: Some(Layout::Planar),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    #[inline]
    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Checks the buffer against `features` and returns the anchor count and
    /// the layout to read it with.
    pub fn resolve(&self, features: usize) -> Result<(usize, Layout)> {
        if features == 0 || self.data.len() % features != 0 {
            return Err(Error::Shape(format!(
                "buffer of {} values is not divisible into {} features",
                self.data.len(),
                features
            )));
        }

        let anchors = self.data.len() / features;

        if self.shape.is_empty() {
            return Ok((anchors, self.layout.unwrap_or(Layout::Planar)));
        }

        let total: usize = self.shape.iter().product();
        if total != self.data.len() {
            return Err(Error::Shape(format!(
                "dims {:?} describe {} values, buffer holds {}",
                self.shape,
                total,
                self.data.len()
            )));
        }

        let dims = match self.shape.as_slice() {
            [1, a, b] | [a, b] => [*a, *b],
            [batch, _, _] => {
                return Err(Error::Shape(format!(
                    "expected a single batch, got {}",
                    batch
                )))
            }
            other => {
                return Err(Error::Shape(format!(
                    "expected 2 or 3 dims, got {:?}",
                    other
                )))
            }
        };

        let planar = dims == [features, anchors];
        let interleaved = dims == [anchors, features];

        match self.layout {
            Some(Layout::Planar) if planar => Ok((anchors, Layout::Planar)),
            Some(Layout::Interleaved) if interleaved => Ok((anchors, Layout::Interleaved)),
            None if planar => Ok((anchors, Layout::Planar)),
            None if interleaved => Ok((anchors, Layout::Interleaved)),
            _ => Err(Error::Shape(format!(
                "dims {:?} do not carry {} features per anchor",
                self.shape, features
            ))),
        }
    }
}

/// Affine map from network-input coordinates back to image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scale {
    sx: f32,
    sy: f32,
    ox: f32,
    oy: f32,
}

impl Scale {
    fn new(model: &ModelSpec, image_width: u32, image_height: u32) -> Self {
        let (in_w, in_h) = (model.input_width as f32, model.input_height as f32);
        let (img_w, img_h) = (image_width as f32, image_height as f32);

        match model.fit {
            Fit::Stretch => Self {
                sx: img_w / in_w,
                sy: img_h / in_h,
                ox: 0.0,
                oy: 0.0,
            },
            Fit::Letterbox => {
                let ratio = (in_w / img_w).min(in_h / img_h);

                Self {
                    sx: 1.0 / ratio,
                    sy: 1.0 / ratio,
                    ox: (in_w - img_w * ratio) / 2.0,
                    oy: (in_h - img_h * ratio) / 2.0,
                }
            }
        }
    }

    #[inline(always)]
    fn x(&self, v: f32) -> f32 {
        (v - self.ox) * self.sx
    }

    #[inline(always)]
    fn y(&self, v: f32) -> f32 {
        (v - self.oy) * self.sy
    }
}

#[derive(Debug, Clone)]
pub struct Decoder {
    mode: Mode,
    model: ModelSpec,
    confidence_threshold: f32,
}

impl Decoder {
    pub fn new(mode: Mode, model: ModelSpec, confidence_threshold: f32) -> Self {
        Self {
            mode,
            model,
            confidence_threshold,
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn features(&self) -> usize {
        self.model.features(self.mode)
    }

    pub fn decode(
        &self,
        raw: &RawOutput<'_>,
        image_width: u32,
        image_height: u32,
    ) -> Result<Vec<Detection>> {
        let features = self.features();
        let (anchors, layout) = raw.resolve(features)?;

        let view = match layout {
            Layout::Planar => {
                ArrayView2::from_shape((features, anchors), raw.data())?.reversed_axes()
            }
            Layout::Interleaved => ArrayView2::from_shape((anchors, features), raw.data())?,
        };

        let scale = Scale::new(&self.model, image_width, image_height);
        let mut results = Vec::new();

        for row in view.outer_iter() {
            let detection = match self.mode {
                Mode::Detection => self.decode_object(row, &scale),
                Mode::Pose => self.decode_pose(row, &scale),
            };

            if let Some(det) = detection {
                results.push(det);
            }
        }

        debug!(
            anchors,
            ?layout,
            kept = results.len(),
            "decoded raw output"
        );

        Ok(results)
    }

    fn decode_object(&self, row: ArrayView1<'_, f32>, scale: &Scale) -> Option<Detection> {
        let offset = BOX_CHANNELS + self.model.objectness as usize;

        // first maximum wins
        let (class_id, max_score) = row
            .slice(s![offset..offset + NUM_CLASSES])
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (idx, val)| {
                if val > best.1 {
                    (idx, val)
                } else {
                    best
                }
            });

        let score = if self.model.objectness {
            row[BOX_CHANNELS] * max_score
        } else {
            max_score
        };

        if !(score >= self.confidence_threshold) {
            return None;
        }

        Some(Detection::object(
            self.bbox(row, scale),
            score.clamp(0.0, 1.0),
            class_id,
        ))
    }

    fn decode_pose(&self, row: ArrayView1<'_, f32>, scale: &Scale) -> Option<Detection> {
        let score = row[BOX_CHANNELS];

        if !(score >= self.confidence_threshold) {
            return None;
        }

        let base = BOX_CHANNELS + 1;
        let keypoints = std::array::from_fn(|k| {
            let at = base + k * KEYPOINT_STRIDE;

            Keypoint {
                x: scale.x(row[at]),
                y: scale.y(row[at + 1]),
                confidence: row[at + 2],
            }
        });

        Some(Detection::pose(
            self.bbox(row, scale),
            score.clamp(0.0, 1.0),
            keypoints,
        ))
    }

    #[inline]
    fn bbox(&self, row: ArrayView1<'_, f32>, scale: &Scale) -> BBox<Ltwh> {
        let net = BBox::xywh(row[0], row[1], row[2], row[3]).as_ltwh();

        BBox::ltwh(
            scale.x(net.left()),
            scale.y(net.top()),
            net.width() * scale.sx,
            net.height() * scale.sy,
        )
    }
}
