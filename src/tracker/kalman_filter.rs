//! Constant-velocity Kalman filter over box center and size.
//!
//! State is `[cx, cy, w, h, vx, vy, vw, vh]`; measurements are `[cx, cy, w, h]`.
//! Noise scales with the box size, so small and large boxes smooth alike.

use nalgebra::{SMatrix, SVector};

pub type StateMean = SVector<f64, 8>;
pub type StateCovariance = SMatrix<f64, 8, 8>;
pub type Measurement = SVector<f64, 4>;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: SMatrix<f64, 8, 8>,
    update_mat: SMatrix<f64, 4, 8>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-dimension noise scale; width drives x terms and height drives y terms.
fn size_scales(w: f64, h: f64) -> [f64; 4] {
    let (w, h) = (w.abs().max(1.0), h.abs().max(1.0));
    [w, h, w, h]
}

impl KalmanFilter {
    pub fn new() -> Self {
        let ndim = 4;
        let mut motion_mat = SMatrix::<f64, 8, 8>::identity();
        for i in 0..ndim {
            motion_mat[(i, ndim + i)] = 1.0;
        }

        let mut update_mat = SMatrix::<f64, 4, 8>::zeros();
        for i in 0..ndim {
            update_mat[(i, i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    pub fn initiate(&self, measurement: Measurement) -> (StateMean, StateCovariance) {
        let mut mean = StateMean::zeros();
        mean.fixed_rows_mut::<4>(0).copy_from(&measurement);

        let scales = size_scales(measurement[2], measurement[3]);
        let mut cov = StateCovariance::zeros();
        for i in 0..4 {
            let pos = 2.0 * self.std_weight_position * scales[i];
            let vel = 10.0 * self.std_weight_velocity * scales[i];
            cov[(i, i)] = pos * pos;
            cov[(i + 4, i + 4)] = vel * vel;
        }

        (mean, cov)
    }

    pub fn predict(&self, mean: &StateMean, covariance: &StateCovariance) -> (StateMean, StateCovariance) {
        let scales = size_scales(mean[2], mean[3]);
        let mut motion_cov = StateCovariance::zeros();
        for i in 0..4 {
            let pos = self.std_weight_position * scales[i];
            let vel = self.std_weight_velocity * scales[i];
            motion_cov[(i, i)] = pos * pos;
            motion_cov[(i + 4, i + 4)] = vel * vel;
        }

        let new_mean = self.motion_mat * mean;
        let new_covariance = self.motion_mat * covariance * self.motion_mat.transpose() + motion_cov;

        (new_mean, new_covariance)
    }

    /// Project the state into measurement space.
    pub fn project(&self, mean: &StateMean, covariance: &StateCovariance) -> (Measurement, SMatrix<f64, 4, 4>) {
        let scales = size_scales(mean[2], mean[3]);
        let mut innovation_cov = SMatrix::<f64, 4, 4>::zeros();
        for i in 0..4 {
            let std = self.std_weight_position * scales[i];
            innovation_cov[(i, i)] = std * std;
        }

        let mean_proj = self.update_mat * mean;
        let covariance_proj = self.update_mat * covariance * self.update_mat.transpose() + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with a measurement.
    ///
    /// Returns the input state unchanged if the innovation covariance is singular.
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        measurement: Measurement,
    ) -> (StateMean, StateCovariance) {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let Some(s_inv) = projected_cov.try_inverse() else {
            return (*mean, *covariance);
        };

        // K = P * H^T * S^-1
        let kalman_gain = covariance * self.update_mat.transpose() * s_inv;
        let innovation = measurement - projected_mean;

        let new_mean = mean + kalman_gain * innovation;
        let new_covariance = covariance - kalman_gain * projected_cov * kalman_gain.transpose();

        (new_mean, new_covariance)
    }
}
