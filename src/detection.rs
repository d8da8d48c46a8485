use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};
use crate::labels::{self, NUM_KEYPOINTS, SKELETON};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "p")]
    pub confidence: f32,
}

impl Keypoint {
    #[inline]
    pub fn point(&self) -> na::Point2<f32> {
        na::Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn is_visible(&self, min_confidence: f32) -> bool {
        self.confidence > min_confidence
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pose {
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

impl Pose {
    /// Skeleton segments whose both ends are visible at `min_confidence`.
    pub fn limbs(&self, min_confidence: f32) -> impl Iterator<Item = (Keypoint, Keypoint)> + '_ {
        SKELETON.iter().filter_map(move |&(a, b)| {
            let (ka, kb) = (self.keypoints[a], self.keypoints[b]);

            if ka.is_visible(min_confidence) && kb.is_visible(min_confidence) {
                Some((ka, kb))
            } else {
                None
            }
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetectionKind {
    Object {
        #[serde(rename = "c")]
        class_id: usize,
        label: String,
    },
    Pose(Pose),
}

/// A single candidate in image space. `id` stays `None` until the tracker
/// assigns an identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltwh>,
    #[serde(rename = "p")]
    pub score: f32,
    pub id: Option<u64>,
    #[serde(flatten)]
    pub kind: DetectionKind,
}

impl Detection {
    pub fn object(bbox: BBox<Ltwh>, score: f32, class_id: usize) -> Self {
        Self {
            bbox,
            score,
            id: None,
            kind: DetectionKind::Object {
                class_id,
                label: labels::class_label(class_id),
            },
        }
    }

    pub fn pose(bbox: BBox<Ltwh>, score: f32, keypoints: [Keypoint; NUM_KEYPOINTS]) -> Self {
        Self {
            bbox,
            score,
            id: None,
            kind: DetectionKind::Pose(Pose { keypoints }),
        }
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        self.bbox.center()
    }

    #[inline]
    pub fn iou(&self, other: &Detection) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    #[inline]
    pub fn class_id(&self) -> Option<usize> {
        match &self.kind {
            DetectionKind::Object { class_id, .. } => Some(*class_id),
            DetectionKind::Pose(_) => None,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        match &self.kind {
            DetectionKind::Object { label, .. } => label,
            DetectionKind::Pose(_) => labels::PERSON,
        }
    }

    #[inline]
    pub fn pose_data(&self) -> Option<&Pose> {
        match &self.kind {
            DetectionKind::Pose(pose) => Some(pose),
            DetectionKind::Object { .. } => None,
        }
    }
}
