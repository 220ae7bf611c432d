mod identity_tracker;
mod kalman_filter;
mod matching;
mod track_record;

pub use identity_tracker::{Identity, IdentityTracker, TrackerConfig};
pub use kalman_filter::{KalmanFilter, Measurement, StateCovariance, StateMean};
pub use matching::nearest_within;
pub use track_record::TrackRecord;
