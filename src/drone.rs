use std::time::Duration;

use log::{info, warn};
use tokio::time::sleep;

use crate::config::{Config, EstimatorConfig, FlightConfig, LedConfig};
use crate::link::FlightLink;
use crate::pose::{Frame, Pose, Waypoint};
use crate::subsystems::estimator;
use crate::subsystems::led_ring::LedRing;
use crate::Result;

/// Time given to the last packet to leave before the link can be closed
const FLUSH_DELAY: Duration = Duration::from_millis(100);

/// Time the estimator is held in reset
const RESET_DELAY: Duration = Duration::from_millis(100);

/// # LED-only session
///
/// Does not touch the position estimator and cannot fly. Useful to check that the link and the LED ring deck work.
pub struct BaseDrone<L: FlightLink> {
    link: L,
    leds: LedConfig,
}

impl<L: FlightLink> BaseDrone<L> {
    /// Start a session on a connected link
    pub fn connect(link: L, leds: LedConfig) -> Self {
        Self { link, leds }
    }

    /// LED ring access
    pub fn led_ring(&self) -> LedRing<'_, L> {
        LedRing::new(&self.link, self.leds.dwell())
    }

    /// Close the link
    pub async fn disconnect(self) {
        self.link.close().await;
    }
}

/// # Flight session
///
/// Opening the session sets the initial position of the Kalman filter, resets it and waits for the position
/// estimate to converge. Once opened the drone accepts position commands, relative to its initial pose unless
/// stated otherwise.
///
/// The link is closed by [Drone::disconnect()], or when the session is dropped.
///
/// ``` no_run
/// # use crazyflie_pilot::{Config, CrazyflieLink, Drone, FileTocCache, Frame, Pose, Waypoint};
/// # async fn fly() -> crazyflie_pilot::Result<()> {
/// let config = Config::default();
/// let link = CrazyflieLink::connect("radio://0/80/2M/E7E7E7E709", FileTocCache::disabled()).await?;
/// let drone = Drone::connect(link, Pose::default(), &config).await?;
///
/// drone.fly_to_point(Waypoint::new(0.8, 0.0, 0.2), None, Frame::Relative).await?;
/// drone.land().await?;
///
/// drone.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct Drone<L: FlightLink> {
    link: L,
    initial_pose: Pose,
    estimator: EstimatorConfig,
    flight: FlightConfig,
    leds: LedConfig,
}

impl<L: FlightLink> Drone<L> {
    /// Start a flight session on a connected link
    ///
    /// Returns once the position estimate has converged. See
    /// [wait_for_position_estimator()](crate::subsystems::estimator::wait_for_position_estimator).
    pub async fn connect(link: L, initial_pose: Pose, config: &Config) -> Result<Self> {
        let drone = Self {
            link,
            initial_pose,
            estimator: config.estimator.clone(),
            flight: config.flight.clone(),
            leds: config.leds.clone(),
        };

        drone.set_initial_position().await?;
        drone.reset_estimator().await?;

        Ok(drone)
    }

    /// Initial pose, origin of the relative commands
    pub fn initial_pose(&self) -> Pose {
        self.initial_pose
    }

    /// LED ring access
    pub fn led_ring(&self) -> LedRing<'_, L> {
        LedRing::new(&self.link, self.leds.dwell())
    }

    /// Close the link
    pub async fn disconnect(self) {
        self.link.close().await;
    }

    /// Write the initial pose to the Kalman filter parameters
    pub async fn set_initial_position(&self) -> Result<()> {
        let pose = self.initial_pose;

        self.link.set_param("kalman.initialX", pose.x as f64).await?;
        self.link.set_param("kalman.initialY", pose.y as f64).await?;
        self.link.set_param("kalman.initialZ", pose.z as f64).await?;
        self.link.set_param("kalman.initialYaw", pose.yaw_radians() as f64).await?;
        Ok(())
    }

    /// Reset the Kalman filter and wait for the position estimate to converge
    ///
    /// Returns the number of variance samples it took to converge.
    pub async fn reset_estimator(&self) -> Result<usize> {
        self.link.set_param("kalman.resetEstimation", 1.0).await?;
        sleep(RESET_DELAY).await;
        self.link.set_param("kalman.resetEstimation", 0.0).await?;

        self.wait_for_position_estimator().await
    }

    /// Wait for the position estimate to converge
    pub async fn wait_for_position_estimator(&self) -> Result<usize> {
        estimator::wait_for_position_estimator(&self.link, &self.estimator).await
    }

    /// Fly through a sequence of waypoints, relative to the initial pose, and stop the motors
    ///
    /// Each setpoint is sent a few times, then the drone is given `time_between_commands` to get there.
    ///
    /// With `check_z_safety`, if the last waypoint is more than the configured margin above the initial height the
    /// drone is first brought down close to the ground above that last waypoint, so that the motors are not cut
    /// while flying high.
    pub async fn fly_sequence(
        &self,
        waypoints: &[Waypoint],
        time_between_commands: Duration,
        check_z_safety: bool,
    ) -> Result<()> {
        let yaw = self.initial_pose.yaw;

        for waypoint in waypoints {
            info!("Setting position {:?}", waypoint);
            let target = self.initial_pose.offset(*waypoint);

            for _ in 0..self.flight.setpoint_repeats {
                self.link
                    .send_position_setpoint(target.x, target.y, target.z, yaw)
                    .await?;
            }
            sleep(time_between_commands).await;
        }

        if let Some(last) = waypoints.last() {
            let height = last.z;
            if check_z_safety && height > self.flight.z_safety_margin {
                warn!(
                    "Last position is {}m above the starting position, sending an extra low setpoint before stopping",
                    height
                );
                let target = self.initial_pose.offset(*last);
                let z = self.initial_pose.z + self.flight.landing_height;
                self.link.send_position_setpoint(target.x, target.y, z, yaw).await?;
                sleep(time_between_commands).await;
            }
        }

        self.link.send_stop_setpoint().await?;
        // The link does not flush its queue when closing
        sleep(FLUSH_DELAY).await;

        Ok(())
    }

    /// Fly the default sequence timing from the configuration
    pub async fn fly_plan(&self, waypoints: &[Waypoint]) -> Result<()> {
        self.fly_sequence(
            waypoints,
            self.flight.time_between_commands(),
            self.flight.check_z_safety,
        )
        .await
    }

    /// Fly to a point
    ///
    /// `yaw` defaults to the initial yaw. A relative point is offset by the initial pose and its setpoint is sent
    /// repeatedly. An absolute point is sent once, as is.
    pub async fn fly_to_point(&self, point: Waypoint, yaw: Option<f32>, frame: Frame) -> Result<()> {
        let yaw = yaw.unwrap_or(self.initial_pose.yaw);

        match frame {
            Frame::Relative => {
                let target = self.initial_pose.offset(point);
                for _ in 0..self.flight.setpoint_repeats {
                    self.link
                        .send_position_setpoint(target.x, target.y, target.z, yaw)
                        .await?;
                    sleep(self.flight.setpoint_interval()).await;
                }
            }
            Frame::Absolute => {
                self.link
                    .send_position_setpoint(point.x, point.y, point.z, yaw)
                    .await?;
            }
        }

        Ok(())
    }

    /// Land at the initial position and stop the motors
    pub async fn land(&self) -> Result<()> {
        let pose = self.initial_pose;
        let z = pose.z + self.flight.landing_height;

        info!("Landing");
        for _ in 0..self.flight.landing_repeats {
            self.link.send_position_setpoint(pose.x, pose.y, z, pose.yaw).await?;
            sleep(self.flight.setpoint_interval()).await;
        }

        self.link.send_stop_setpoint().await?;
        sleep(FLUSH_DELAY).await;
        Ok(())
    }

    /// Stop the motors and release the low-level setpoint priority
    pub async fn stop(&self) -> Result<()> {
        self.link.send_stop_setpoint().await?;
        self.link.notify_setpoint_stop(0).await?;
        sleep(FLUSH_DELAY).await;
        Ok(())
    }
}
