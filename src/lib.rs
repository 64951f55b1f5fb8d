//! # Crazyflie pilot
//!
//! This crate flies a Crazyflie 2.1 through sequences of waypoints, or from voice commands, using the
//! [crazyflie-lib] Rust API. The position estimation, the position controller and the radio protocol all run in
//! the Crazyflie firmware and in the lib: this crate only sequences high-level commands.
//!
//! ## Usage
//!
//! The basic procedure is:
//!  - Open a [CrazyflieLink] to the Crazyflie URI
//!  - Create a [Drone] from the link and the initial pose of the Crazyflie. This sets the initial position of the
//!    Kalman filter, resets it and waits for the position estimate to converge
//!  - Fly waypoints relative to the initial pose with [Drone::fly_sequence()] or [Drone::fly_to_point()]
//!  - Land with [Drone::land()] and call [Drone::disconnect()]
//!
//! A [BaseDrone] only gives access to the LED ring and can be used without a positioning system.
//!
//! All the commands go through the [FlightLink] trait, which can be implemented to drive something other than a
//! real Crazyflie.
//!
//! For example:
//! ``` no_run
//! # use crazyflie_pilot::{Config, CrazyflieLink, Drone, FileTocCache, Waypoint};
//! # async fn test() -> crazyflie_pilot::Result<()> {
//! let config = Config::load()?;
//!
//! let toc_cache = FileTocCache::from_path(config.link.toc_cache.as_deref());
//! let link = CrazyflieLink::connect(&config.link.uri, toc_cache).await?;
//! let drone = Drone::connect(link, config.initial_pose, &config).await?;
//!
//! let square = [
//!     Waypoint::new(0.0, 0.0, 0.4),
//!     Waypoint::new(0.5, 0.0, 0.4),
//!     Waypoint::new(0.5, 0.5, 0.4),
//!     Waypoint::new(0.0, 0.5, 0.4),
//!     Waypoint::new(0.0, 0.0, 0.2),
//! ];
//! drone.fly_plan(&square).await?;
//!
//! drone.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! [crazyflie-lib]: https://github.com/bitcraze/crazyflie-lib-rs

#![warn(missing_docs)]

pub mod config;
mod drone;
mod error;
pub mod link;
pub mod logging;
mod pose;
pub mod subsystems;
pub mod toc_cache;
pub mod voice;

pub use crate::config::{Config, FlightPlan};
pub use crate::drone::{BaseDrone, Drone};
pub use crate::error::{Error, Result};
pub use crate::link::{CrazyflieLink, FlightLink, VarianceStream};
pub use crate::pose::{Frame, Pose, Waypoint};
pub use crate::subsystems::estimator::{VarianceSample, VarianceWindow};
pub use crate::subsystems::led_ring::{LedRing, RingColor};
pub use crate::toc_cache::FileTocCache;
