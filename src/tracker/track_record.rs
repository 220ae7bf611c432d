//! Per-identity record kept by the tracker.

use crate::geometry::Rect;
use crate::tracker::kalman_filter::{KalmanFilter, Measurement, StateCovariance, StateMean};

fn measurement(rect: &Rect) -> Measurement {
    let (cx, cy) = rect.center();
    Measurement::new(cx as f64, cy as f64, rect.width as f64, rect.height as f64)
}

/// Last known box of one identity plus its smoothing state.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    /// Unique identity, never reused
    pub id: u64,
    /// Box of the most recent matching detection
    pub rect: Rect,
    /// Frame index the identity was created on
    pub first_seen: u64,
    /// Frame index of the most recent match
    pub last_seen: u64,
    /// Number of detections matched, including the creating one
    pub hits: u32,
    /// Kalman filter state (mean, covariance); `None` when smoothing is off
    filter_state: Option<(StateMean, StateCovariance)>,
}

impl TrackRecord {
    pub fn new(id: u64, rect: Rect, frame_index: u64, kalman_filter: Option<&KalmanFilter>) -> Self {
        Self {
            id,
            rect,
            first_seen: frame_index,
            last_seen: frame_index,
            hits: 1,
            filter_state: kalman_filter.map(|kf| kf.initiate(measurement(&rect))),
        }
    }

    /// Advance the motion model by one frame.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if let Some((mean, cov)) = &self.filter_state {
            self.filter_state = Some(kalman_filter.predict(mean, cov));
        }
    }

    /// Record a matching detection.
    ///
    /// Only the first match of a frame counts as a hit and corrects the
    /// filter; later matches in the same frame just replace the box.
    pub fn update(&mut self, rect: Rect, frame_index: u64, kalman_filter: &KalmanFilter) {
        self.rect = rect;
        if self.last_seen == frame_index {
            return;
        }
        self.last_seen = frame_index;
        self.hits += 1;

        if let Some((mean, cov)) = &self.filter_state {
            self.filter_state = Some(kalman_filter.update(mean, cov, measurement(&rect)));
        }
    }

    /// Frames elapsed since the last match.
    pub fn idle_frames(&self, frame_index: u64) -> u64 {
        frame_index.saturating_sub(self.last_seen)
    }

    /// Filtered box; the raw box when smoothing is off.
    pub fn smoothed_rect(&self) -> Rect {
        match &self.filter_state {
            Some((mean, _)) => Rect::from_center(mean[0] as f32, mean[1] as f32, mean[2] as f32, mean[3] as f32),
            None => self.rect,
        }
    }

    /// Velocity of the box center in pixels per frame, when smoothing is on.
    pub fn velocity(&self) -> Option<(f32, f32)> {
        self.filter_state
            .as_ref()
            .map(|(mean, _)| (mean[4] as f32, mean[5] as f32))
    }
}
