//! Greedy nearest-centroid identity assignment.

use std::collections::BTreeMap;

use tracing::trace;

use crate::detection::Detection;
use crate::geometry::Rect;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching;
use crate::tracker::track_record::TrackRecord;

/// Configuration for the IdentityTracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// A detection joins a record only when their centers are strictly closer than this.
    pub max_distance: f32,
    /// Records unmatched for more than this many frames are evicted; `None` keeps them forever.
    pub max_idle_frames: Option<u64>,
    /// Run the Kalman filter for smoothed boxes.
    pub smoothing: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            max_idle_frames: Some(30),
            smoothing: true,
        }
    }
}

impl TrackerConfig {
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_max_idle_frames(mut self, max_idle_frames: Option<u64>) -> Self {
        self.max_idle_frames = max_idle_frames;
        self
    }

    pub fn with_smoothing(mut self, smoothing: bool) -> Self {
        self.smoothing = smoothing;
        self
    }
}

/// Identity given to one detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Identity {
    pub id: u64,
    /// Index of the detection in the slice passed to `update`.
    pub detection_index: usize,
    /// The detection's own box.
    pub rect: Rect,
    /// The record's filtered box after this frame's correction.
    pub smoothed_rect: Rect,
    /// True when the identity was created for this detection.
    pub is_new: bool,
}

/// Assigns each detection the identity of the nearest known box.
///
/// Detections are visited in order. Each one takes the identity of the record
/// whose last known box has the closest center, provided the distance is below
/// `max_distance`; ties go to the lowest identity. Otherwise a fresh identity
/// is allocated. A record may absorb several detections in one frame, and a
/// record created earlier in the frame can be matched by later detections.
pub struct IdentityTracker {
    records: BTreeMap<u64, TrackRecord>,
    next_id: u64,
    frame_index: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
}

impl Default for IdentityTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl IdentityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 0,
            frame_index: 0,
            config,
            kalman_filter: KalmanFilter::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of `update` calls so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&TrackRecord> {
        self.records.get(&id)
    }

    /// Live records in identity order.
    pub fn records(&self) -> impl Iterator<Item = &TrackRecord> {
        self.records.values()
    }

    /// Assign identities for one frame. Degenerate detections are skipped.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<Identity> {
        self.frame_index += 1;

        if self.config.smoothing {
            for record in self.records.values_mut() {
                record.predict(&self.kalman_filter);
            }
        }

        let mut identities = Vec::with_capacity(detections.len());
        for (detection_index, det) in detections.iter().enumerate() {
            if !det.is_valid() {
                continue;
            }

            let nearest = matching::nearest_within(
                self.records.iter().map(|(&id, r)| (id, &r.rect)),
                &det.rect,
                self.config.max_distance,
            );

            let (id, is_new) = match nearest {
                Some(id) => {
                    if let Some(record) = self.records.get_mut(&id) {
                        record.update(det.rect, self.frame_index, &self.kalman_filter);
                    }
                    (id, false)
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    let kf = self.config.smoothing.then_some(&self.kalman_filter);
                    self.records
                        .insert(id, TrackRecord::new(id, det.rect, self.frame_index, kf));
                    trace!(id, label = %det.label, "new identity");
                    (id, true)
                }
            };

            let smoothed_rect = self
                .records
                .get(&id)
                .map_or(det.rect, TrackRecord::smoothed_rect);
            identities.push(Identity {
                id,
                detection_index,
                rect: det.rect,
                smoothed_rect,
                is_new,
            });
        }

        self.evict_idle();
        identities
    }

    fn evict_idle(&mut self) {
        let Some(max_idle) = self.config.max_idle_frames else {
            return;
        };
        let frame_index = self.frame_index;
        let before = self.records.len();
        self.records
            .retain(|_, record| record.idle_frames(frame_index) <= max_idle);
        let evicted = before - self.records.len();
        if evicted > 0 {
            trace!(evicted, remaining = self.records.len(), "evicted idle identities");
        }
    }

    /// Forget every record. Identities keep increasing from where they were.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectionKind, DetectorKind};

    fn face(x: f32, y: f32) -> Detection {
        Detection::new(Rect::new(x, y, 40.0, 40.0), "face", DetectionKind::Face, DetectorKind::Cascade)
    }

    #[test]
    fn test_same_frame_detections_share_new_record() {
        let mut tracker = IdentityTracker::default();
        let ids = tracker.update(&[face(0.0, 0.0), face(50.0, 0.0)]);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].id, 0);
        assert_eq!(ids[1].id, 0);
        assert!(ids[0].is_new);
        assert!(!ids[1].is_new);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_far_detections_get_distinct_ids() {
        let mut tracker = IdentityTracker::default();
        let ids = tracker.update(&[face(0.0, 0.0), face(200.0, 0.0), face(400.0, 0.0)]);
        let values: Vec<u64> = ids.iter().map(|i| i.id).collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn test_degenerate_detection_skipped() {
        let mut tracker = IdentityTracker::default();
        let bad = Detection::new(Rect::new(0.0, 0.0, 0.0, 10.0), "x", DetectionKind::Face, DetectorKind::Cascade);
        let ids = tracker.update(&[bad, face(10.0, 10.0)]);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].detection_index, 1);
        assert_eq!(ids[0].id, 0);
    }

    #[test]
    fn test_smoothing_disabled_returns_raw_box() {
        let mut tracker = IdentityTracker::new(TrackerConfig::default().with_smoothing(false));
        tracker.update(&[face(0.0, 0.0)]);
        let ids = tracker.update(&[face(10.0, 0.0)]);
        assert_eq!(ids[0].smoothed_rect, ids[0].rect);
    }
}
