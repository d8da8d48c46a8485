use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

use crate::circular_queue::CircularQueue;

/// How far back (in trail points) the current position is compared against.
pub const MAX_LOOKBACK: usize = 5;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    #[serde(rename = "still")]
    Still,
    #[serde(rename = "moving left")]
    Left,
    #[serde(rename = "moving right")]
    Right,
    #[serde(rename = "moving up")]
    Up,
    #[serde(rename = "moving down")]
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Still => "still",
            Direction::Left => "moving left",
            Direction::Right => "moving right",
            Direction::Up => "moving up",
            Direction::Down => "moving down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction from a displacement. The larger axis decides, `|dx| == |dy|`
/// goes to the vertical axis, and only moves strictly beyond `threshold` count.
pub fn classify_displacement(dx: f32, dy: f32, threshold: f32) -> Direction {
    if dx.abs() > dy.abs() {
        if dx > threshold {
            return Direction::Right;
        }
        if dx < -threshold {
            return Direction::Left;
        }
    } else {
        if dy > threshold {
            return Direction::Down;
        }
        if dy < -threshold {
            return Direction::Up;
        }
    }

    Direction::Still
}

/// Direction of a trail, comparing its newest point with the one up to
/// `MAX_LOOKBACK` steps earlier.
pub fn classify(history: &CircularQueue<na::Point2<f32>>, threshold: f32) -> Direction {
    if history.len() < 2 {
        return Direction::Still;
    }

    let lookback = MAX_LOOKBACK.min(history.len() - 1);

    match (history.latest(), history.nth_latest(lookback)) {
        (Some(current), Some(past)) => {
            let d = current - past;
            classify_displacement(d.x, d.y, threshold)
        }
        _ => Direction::Still,
    }
}
