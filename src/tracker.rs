use crate::track::Track;
use crate::Detection;

use nalgebra as na;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Every live track keyed by id, plus the id and frame counters.
///
/// This is the only state carried from one frame to the next.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
    frame: u64,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: u64) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Tracks in ascending id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Id the next new track will receive.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Number of frames processed so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn allocate(&mut self, pos: na::Point2<f32>, max_trail_length: usize) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tracks
            .insert(id, Track::new(id, self.frame, pos, max_trail_length));

        id
    }

    /// Closest track whose last position is strictly within `max_distance`.
    /// Equal distances keep the lower id.
    fn nearest(&self, pos: &na::Point2<f32>, max_distance: f32) -> Option<u64> {
        let mut best: Option<(u64, f32)> = None;

        for track in self.tracks.values() {
            let last = match track.last_position() {
                Some(last) => last,
                None => continue,
            };

            let dist = na::distance(pos, &last);
            if dist < max_distance && best.map_or(true, |(_, d)| dist < d) {
                best = Some((track.id, dist));
            }
        }

        best.map(|(id, _)| id)
    }
}

/// Greedy nearest-neighbour identity assignment.
///
/// Detections are matched one at a time in the order given. A track that has
/// already been claimed this frame stays a candidate for later detections, so
/// two nearby detections may end up sharing one id. Tracks that receive no
/// detection are dropped at the end of the frame.
#[derive(Debug, Clone)]
pub struct Tracker {
    max_match_distance: f32,
    max_trail_length: usize,
    table: TrackTable,
}

impl Tracker {
    pub fn new(max_match_distance: f32, max_trail_length: usize) -> Self {
        Self {
            max_match_distance,
            max_trail_length,
            table: TrackTable::new(),
        }
    }

    #[inline]
    pub fn table(&self) -> &TrackTable {
        &self.table
    }

    pub fn reset(&mut self) {
        self.table = TrackTable::new();
    }

    /// Runs one frame against the owned table and returns the detections with
    /// their ids set.
    pub fn update(&mut self, dets: Vec<Detection>) -> Vec<Detection> {
        let table = std::mem::take(&mut self.table);
        let (dets, table) = self.assign(table, dets);
        self.table = table;

        dets
    }

    /// One tracking step: consumes `table` and returns it updated.
    pub fn assign(
        &self,
        mut table: TrackTable,
        mut dets: Vec<Detection>,
    ) -> (Vec<Detection>, TrackTable) {
        let frame = table.frame;
        let before = table.len();
        let mut seen = BTreeSet::new();
        let mut born = 0;

        for det in dets.iter_mut() {
            let pos = det.center();

            let id = match table.nearest(&pos, self.max_match_distance) {
                Some(id) => {
                    if let Some(track) = table.tracks.get_mut(&id) {
                        track.update(frame, pos);
                    }
                    id
                }
                None => {
                    born += 1;
                    table.allocate(pos, self.max_trail_length)
                }
            };

            det.id = Some(id);
            seen.insert(id);
        }

        table.tracks.retain(|id, _| seen.contains(id));
        table.frame += 1;

        debug!(
            frame,
            detections = dets.len(),
            born,
            evicted = before + born - table.len(),
            tracks = table.len(),
            "assigned track ids"
        );

        (dets, table)
    }
}
