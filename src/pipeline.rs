use crate::config::{Config, Mode, ModelSpec};
use crate::decoder::{Decoder, RawOutput};
use crate::error::{Error, Result};
use crate::frame::{Frame, TrackedObject};
use crate::motion::{self, Direction};
use crate::nms::non_maximum_suppression;
use crate::tracker::{TrackTable, Tracker};

use tracing::{debug, info, warn};

/// Marks the pipeline generation an inference request was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Decode, suppress, track and classify, one caller-driven frame at a time.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    model: ModelSpec,
    dims: (u32, u32),
    decoder: Decoder,
    tracker: Tracker,
    generation: u64,
}

impl Pipeline {
    pub fn new(config: Config, model: ModelSpec, image_width: u32, image_height: u32) -> Result<Self> {
        config.validate()?;
        model.validate()?;
        check_dims(image_width, image_height)?;

        info!(
            mode = ?config.mode,
            input_width = model.input_width,
            input_height = model.input_height,
            image_width,
            image_height,
            "pipeline initialized"
        );

        Ok(Self {
            decoder: Decoder::new(config.mode, model, config.confidence_threshold),
            tracker: Tracker::new(config.max_match_distance, config.max_trail_length),
            config,
            model,
            dims: (image_width, image_height),
            generation: 0,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    #[inline]
    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        self.dims
    }

    #[inline]
    pub fn tracks(&self) -> &TrackTable {
        self.tracker.table()
    }

    /// Token to hand back with the result of an inference request issued now.
    #[inline]
    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    /// Drops every track. Results ticketed before the reset will be discarded.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.generation += 1;

        debug!(generation = self.generation, "pipeline reset");
    }

    /// Switches between detection and pose models; tracks start over.
    pub fn set_mode(&mut self, mode: Mode, model: ModelSpec) -> Result<()> {
        model.validate()?;

        self.config.mode = mode;
        self.model = model;
        self.decoder = Decoder::new(mode, model, self.config.confidence_threshold);
        self.reset();

        info!(?mode, "pipeline mode changed");
        Ok(())
    }

    /// New source resolution; tracks start over.
    pub fn resize(&mut self, image_width: u32, image_height: u32) -> Result<()> {
        check_dims(image_width, image_height)?;

        self.dims = (image_width, image_height);
        self.reset();

        Ok(())
    }

    /// Runs one frame. A malformed buffer fails this frame only and leaves
    /// the tracks as they were.
    pub fn process_frame(&mut self, raw: &RawOutput<'_>) -> Result<Frame> {
        let (width, height) = self.dims;

        let dets = match self.decoder.decode(raw, width, height) {
            Ok(dets) => dets,
            Err(err) => {
                warn!(error = %err, "skipping frame");
                return Err(err);
            }
        };

        let dets = non_maximum_suppression(dets, self.config.iou_threshold);
        let index = self.tracker.table().frame();
        let dets = self.tracker.update(dets);

        let table = self.tracker.table();
        let objects = dets
            .into_iter()
            .filter_map(|detection| {
                let id = detection.id?;
                let (direction, trail) = match table.get(id) {
                    Some(track) => (
                        motion::classify(track.history(), self.config.movement_threshold),
                        track.trail(),
                    ),
                    None => (Direction::Still, Vec::new()),
                };

                Some(TrackedObject {
                    id,
                    detection,
                    direction,
                    trail,
                })
            })
            .collect();

        Ok(Frame {
            index,
            dims: self.dims,
            objects,
            identities: table.len(),
        })
    }

    /// Like [`Pipeline::process_frame`], but returns `Ok(None)` without
    /// touching the tracks when `ticket` predates the last reset.
    pub fn process_ticketed(
        &mut self,
        ticket: Ticket,
        raw: &RawOutput<'_>,
    ) -> Result<Option<Frame>> {
        if ticket != self.ticket() {
            debug!(
                ticket = ticket.0,
                generation = self.generation,
                "discarding stale inference result"
            );
            return Ok(None);
        }

        self.process_frame(raw).map(Some)
    }
}

fn check_dims(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::Config(format!(
            "image size must be positive, got {}x{}",
            width, height
        )));
    }

    Ok(())
}
