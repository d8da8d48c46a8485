pub mod bbox;
pub mod circular_queue;
pub mod config;
pub mod decoder;
pub mod detection;
pub mod error;
pub mod frame;
pub mod labels;
pub mod motion;
pub mod nms;
pub mod pipeline;
pub mod tracker;

mod track;

pub use config::{Config, Fit, Mode, ModelSpec};
pub use decoder::{Decoder, Layout, RawOutput};
pub use detection::{Detection, DetectionKind, Keypoint, Pose};
pub use error::{Error, Result};
pub use frame::{Frame, TrackedObject};
pub use motion::Direction;
pub use pipeline::{Pipeline, Ticket};
pub use track::Track;
pub use tracker::{TrackTable, Tracker};
