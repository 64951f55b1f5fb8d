//! # Crazyflie link
//!
//! The [FlightLink] trait is everything the pilot needs from a connected Crazyflie: writing parameters, sending
//! position setpoints and streaming the Kalman filter position variances. [CrazyflieLink] implements it on top of
//! the [crazyflie-lib] Rust API.
//!
//! Like the Crazyflie library subsystems, all methods take `&self`.
//!
//! [crazyflie-lib]: https://github.com/bitcraze/crazyflie-lib-rs

use std::time::Duration;

use async_trait::async_trait;
use crazyflie_lib::subsystems::log::{LogPeriod, LogStream};
use crazyflie_lib::Crazyflie;
use crazyflie_link::LinkContext;
use log::{debug, info};

use crate::subsystems::estimator::{VarianceSample, VARIANCE_VARIABLES};
use crate::toc_cache::FileTocCache;
use crate::{Error, Result};

/// # Commands and telemetry needed to fly
#[async_trait(?Send)]
pub trait FlightLink {
    /// Set a parameter, the value is converted to the parameter type
    async fn set_param(&self, name: &str, value: f64) -> Result<()>;

    /// Send an absolute position setpoint, yaw in degrees
    async fn send_position_setpoint(&self, x: f32, y: f32, z: f32, yaw: f32) -> Result<()>;

    /// Send a stop setpoint, cutting the motors
    async fn send_stop_setpoint(&self) -> Result<()>;

    /// Lower the priority of the low-level setpoints so that other sources can take over
    async fn notify_setpoint_stop(&self, remain_valid_milliseconds: u32) -> Result<()>;

    /// Start streaming `kalman.varPX`, `kalman.varPY` and `kalman.varPZ` at the given period
    async fn open_variance_stream(&self, period: Duration) -> Result<Box<dyn VarianceStream>>;

    /// Close the link
    async fn close(&self);
}

/// # Stream of position variance samples
#[async_trait(?Send)]
pub trait VarianceStream {
    /// Wait for the next sample
    async fn next_sample(&mut self) -> Result<VarianceSample>;

    /// Stop the underlying log block. Further reads return [Error::Disconnected].
    async fn stop(&mut self) -> Result<()>;
}

/// # Link to a real Crazyflie
pub struct CrazyflieLink {
    crazyflie: Crazyflie,
    _context: LinkContext,
}

impl CrazyflieLink {
    /// Open the radio link and connect the Crazyflie
    ///
    /// The TOC cache avoids downloading the param and log tables of content at each connection.
    pub async fn connect(uri: &str, toc_cache: FileTocCache) -> Result<Self> {
        let context = LinkContext::new();

        info!("Connecting to {} ...", uri);
        let crazyflie = Crazyflie::connect_from_uri(&context, uri, toc_cache).await?;
        info!("Connected to {}", uri);

        Ok(Self {
            crazyflie,
            _context: context,
        })
    }
}

#[async_trait(?Send)]
impl FlightLink for CrazyflieLink {
    async fn set_param(&self, name: &str, value: f64) -> Result<()> {
        debug!("Setting {} to {}", name, value);
        self.crazyflie.param.set_lossy(name, value).await?;
        Ok(())
    }

    async fn send_position_setpoint(&self, x: f32, y: f32, z: f32, yaw: f32) -> Result<()> {
        self.crazyflie.commander.setpoint_position(x, y, z, yaw).await?;
        Ok(())
    }

    async fn send_stop_setpoint(&self) -> Result<()> {
        self.crazyflie.commander.setpoint_stop().await?;
        Ok(())
    }

    async fn notify_setpoint_stop(&self, remain_valid_milliseconds: u32) -> Result<()> {
        self.crazyflie
            .commander
            .notify_setpoint_stop(remain_valid_milliseconds)
            .await?;
        Ok(())
    }

    async fn open_variance_stream(&self, period: Duration) -> Result<Box<dyn VarianceStream>> {
        let log_period =
            LogPeriod::from_millis(period.as_millis() as u64).map_err(|_| Error::InvalidLogPeriod(period))?;

        let mut block = self.crazyflie.log.create_block().await?;
        for name in VARIANCE_VARIABLES {
            block.add_variable(name).await?;
        }
        let stream = block.start(log_period).await?;

        Ok(Box::new(LogVarianceStream {
            stream: Some(stream),
        }))
    }

    async fn close(&self) {
        self.crazyflie.disconnect().await;
        info!("Disconnected");
    }
}

struct LogVarianceStream {
    stream: Option<LogStream>,
}

#[async_trait(?Send)]
impl VarianceStream for LogVarianceStream {
    async fn next_sample(&mut self) -> Result<VarianceSample> {
        let stream = self.stream.as_ref().ok_or(Error::Disconnected)?;
        let data = stream.next().await?;

        VarianceSample::from_log_data(&data.data)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            stream.stop().await?;
        }
        Ok(())
    }
}
