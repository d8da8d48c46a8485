use nalgebra as na;

use crate::circular_queue::CircularQueue;

/// Identity plus the recent centres (the trail) of one physical object.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: u64,
    pub last_seen_frame: u64,
    history: CircularQueue<na::Point2<f32>>,
}

impl Track {
    pub fn new(id: u64, frame: u64, pos: na::Point2<f32>, max_trail_length: usize) -> Self {
        let mut history = CircularQueue::with_capacity(max_trail_length);
        history.push(pos);

        Self {
            id,
            last_seen_frame: frame,
            history,
        }
    }

    pub fn update(&mut self, frame: u64, pos: na::Point2<f32>) {
        self.history.push(pos);
        self.last_seen_frame = frame;
    }

    #[inline]
    pub fn last_position(&self) -> Option<na::Point2<f32>> {
        self.history.latest().copied()
    }

    #[inline]
    pub fn history(&self) -> &CircularQueue<na::Point2<f32>> {
        &self.history
    }

    #[inline]
    pub fn trail(&self) -> Vec<na::Point2<f32>> {
        self.history.iter().copied().collect()
    }
}
