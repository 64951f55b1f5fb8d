//! # Position estimator convergence
//!
//! After the Kalman filter is reset, the position estimate needs a moment to settle before the Crazyflie can be
//! trusted to fly. The variances of the estimated position (`kalman.varPX`, `kalman.varPY` and `kalman.varPZ`) are
//! logged and kept in a sliding window per axis. The estimate is considered stable once the spread
//! (max - min) of every window is below a threshold.
//!
//! The windows are seeded with a large variance, so at least a full window of samples is needed before
//! convergence can be declared.

use std::collections::{HashMap, VecDeque};

use crazyflie_lib::Value;
use log::{debug, info, warn};

use crate::config::EstimatorConfig;
use crate::link::{FlightLink, VarianceStream};
use crate::{Error, Result};

/// Log variable of the X position variance
pub const VAR_PX: &str = "kalman.varPX";
/// Log variable of the Y position variance
pub const VAR_PY: &str = "kalman.varPY";
/// Log variable of the Z position variance
pub const VAR_PZ: &str = "kalman.varPZ";

/// Log variables streamed while waiting for convergence
pub const VARIANCE_VARIABLES: [&str; 3] = [VAR_PX, VAR_PY, VAR_PZ];

const SEED_VARIANCE: f64 = 1000.0;

/// # One sample of the position variances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceSample {
    /// X position variance
    pub var_px: f64,
    /// Y position variance
    pub var_py: f64,
    /// Z position variance
    pub var_pz: f64,
}

impl VarianceSample {
    /// Create a sample
    pub fn new(var_px: f64, var_py: f64, var_pz: f64) -> Self {
        Self {
            var_px,
            var_py,
            var_pz,
        }
    }

    /// Extract the three variances from a log data packet
    pub fn from_log_data(data: &HashMap<String, Value>) -> Result<Self> {
        let get = |name: &str| {
            data.get(name)
                .map(Value::to_f64_lossy)
                .ok_or_else(|| Error::MissingLogVariable(name.to_owned()))
        };

        Ok(Self::new(get(VAR_PX)?, get(VAR_PY)?, get(VAR_PZ)?))
    }

    fn axes(&self) -> [f64; 3] {
        [self.var_px, self.var_py, self.var_pz]
    }
}

/// # Sliding windows of variance samples
#[derive(Debug, Clone)]
pub struct VarianceWindow {
    axes: [VecDeque<f64>; 3],
    threshold: f64,
}

impl VarianceWindow {
    /// Create windows of `len` samples per axis. A `len` of 0 is treated as 1.
    pub fn new(len: usize, threshold: f64) -> Self {
        let seeded: VecDeque<f64> = std::iter::repeat(SEED_VARIANCE).take(len.max(1)).collect();

        Self {
            axes: [seeded.clone(), seeded.clone(), seeded],
            threshold,
        }
    }

    /// Push a sample, dropping the oldest one, and return true if the estimate has converged
    pub fn push(&mut self, sample: VarianceSample) -> bool {
        for (axis, value) in self.axes.iter_mut().zip(sample.axes()) {
            axis.pop_front();
            axis.push_back(value);
        }

        self.is_converged()
    }

    /// Spread (max - min) of the X, Y and Z windows. NaN if a window contains NaN.
    pub fn spread(&self) -> [f64; 3] {
        let mut spread = [0.0; 3];
        for (s, axis) in spread.iter_mut().zip(&self.axes) {
            *s = spread_of(axis);
        }
        spread
    }

    /// True when the spread of all axes is below the threshold
    pub fn is_converged(&self) -> bool {
        self.spread().iter().all(|s| *s < self.threshold)
    }
}

fn spread_of(values: &VecDeque<f64>) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

/// Wait until the position estimate of the Crazyflie has converged
///
/// Streams the position variances at the configured period until [VarianceWindow::is_converged()]. Without a
/// configured timeout this blocks for as long as the estimator does not converge. Returns the number of samples
/// that were consumed.
pub async fn wait_for_position_estimator<L: FlightLink + ?Sized>(
    link: &L,
    config: &EstimatorConfig,
) -> Result<usize> {
    info!("Waiting for estimator to find position...");

    let mut stream = link.open_variance_stream(config.period()).await?;
    let mut window = VarianceWindow::new(config.window, config.threshold);

    let outcome = match config.timeout() {
        Some(limit) => {
            match tokio::time::timeout(limit, watch(stream.as_mut(), &mut window)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::EstimatorTimeout(limit)),
            }
        }
        None => watch(stream.as_mut(), &mut window).await,
    };

    if let Err(e) = stream.stop().await {
        warn!("Could not stop the variance log block: {}", e);
    }

    let samples = outcome?;
    info!("Position estimate converged after {} samples", samples);
    Ok(samples)
}

async fn watch(stream: &mut dyn VarianceStream, window: &mut VarianceWindow) -> Result<usize> {
    let mut samples = 0;
    loop {
        let sample = stream.next_sample().await?;
        samples += 1;

        if window.push(sample) {
            return Ok(samples);
        }

        let [x, y, z] = window.spread();
        debug!("Variance spread {:.6} {:.6} {:.6}", x, y, z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.001;

    fn stable() -> VarianceSample {
        VarianceSample::new(0.0002, 0.0003, 0.0001)
    }

    #[test]
    fn needs_a_full_window_of_samples() {
        let mut window = VarianceWindow::new(10, THRESHOLD);

        for _ in 0..9 {
            assert!(!window.push(stable()));
        }
        assert!(window.push(stable()));
    }

    #[test]
    fn one_noisy_axis_prevents_convergence() {
        let mut window = VarianceWindow::new(3, THRESHOLD);

        window.push(VarianceSample::new(0.001, 0.001, 0.010));
        window.push(VarianceSample::new(0.001, 0.001, 0.005));
        assert!(!window.push(VarianceSample::new(0.001, 0.001, 0.001)));

        let [x, y, z] = window.spread();
        assert_eq!(x, 0.0);
        assert_eq!(y, 0.0);
        assert!((z - 0.009).abs() < 1e-12);
    }

    #[test]
    fn spread_must_be_strictly_below_threshold() {
        let mut window = VarianceWindow::new(2, 0.5);

        window.push(VarianceSample::new(1.0, 1.0, 1.0));
        assert!(!window.push(VarianceSample::new(1.5, 1.0, 1.0)));
        assert!(window.push(VarianceSample::new(1.4, 1.0, 1.0)));
    }

    #[test]
    fn old_samples_leave_the_window() {
        let mut window = VarianceWindow::new(2, THRESHOLD);

        window.push(VarianceSample::new(5.0, 5.0, 5.0));
        window.push(stable());
        assert!(!window.is_converged());
        assert!(window.push(stable()));
    }

    #[test]
    fn nan_never_converges() {
        let mut window = VarianceWindow::new(1, THRESHOLD);

        assert!(!window.push(VarianceSample::new(f64::NAN, 0.0, 0.0)));
        assert!(window.spread()[0].is_nan());
    }

    #[test]
    fn zero_length_window_keeps_one_sample() {
        let mut window = VarianceWindow::new(0, THRESHOLD);

        assert!(window.push(stable()));
    }

    #[test]
    fn sample_from_log_data() {
        let mut data = HashMap::new();
        data.insert(VAR_PX.to_owned(), Value::F32(0.5));
        data.insert(VAR_PY.to_owned(), Value::F32(0.25));
        data.insert(VAR_PZ.to_owned(), Value::F32(0.125));

        let sample = VarianceSample::from_log_data(&data).unwrap();

        assert_eq!(sample, VarianceSample::new(0.5, 0.25, 0.125));
    }

    #[test]
    fn sample_with_missing_variable() {
        let mut data = HashMap::new();
        data.insert(VAR_PX.to_owned(), Value::F32(0.5));
        data.insert(VAR_PZ.to_owned(), Value::F32(0.125));

        let result = VarianceSample::from_log_data(&data);

        assert!(matches!(result, Err(Error::MissingLogVariable(name)) if name == VAR_PY));
    }
}
