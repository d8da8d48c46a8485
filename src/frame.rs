use nalgebra as na;
use serde_derive::Serialize;

use crate::detection::Detection;
use crate::motion::Direction;

/// A detection after tracking, ready for the overlay.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub id: u64,
    pub detection: Detection,
    pub direction: Direction,
    /// Recent centres, oldest first.
    pub trail: Vec<na::Point2<f32>>,
}

/// Result of one processed frame.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub dims: (u32, u32),
    pub objects: Vec<TrackedObject>,
    /// Live identities after this frame.
    pub identities: usize,
}

impl Frame {
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
