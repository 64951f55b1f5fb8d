//! # LED ring deck
//!
//! The LED ring is driven through the `ring` parameter group. The `ring.effect` parameter selects one of the
//! effects implemented in the firmware, see the [LED ring documentation]. The [SOLID_COLOR_EFFECT] shows the color
//! set in `ring.solidRed`, `ring.solidGreen` and `ring.solidBlue`.
//!
//! Range checks do not fail: an out of range value is reported by returning `false` and nothing is written.
//!
//! [LED ring documentation]: https://wiki.bitcraze.io/projects:crazyflie2:expansionboards:ledring

use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::link::FlightLink;
use crate::pose::Waypoint;
use crate::Result;

/// Number of effects implemented in the firmware
pub const RING_EFFECT_COUNT: u8 = 13;

/// Effect displaying the solid color parameters
pub const SOLID_COLOR_EFFECT: u8 = 7;

/// Maximum intensity of a color channel
pub const MAX_CHANNEL: u8 = 100;

/// # Solid color
///
/// Channels go from 0 to [MAX_CHANNEL].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingColor {
    /// Red intensity
    pub red: u8,
    /// Green intensity
    pub green: u8,
    /// Blue intensity
    pub blue: u8,
}

impl RingColor {
    /// Full red
    pub const RED: RingColor = RingColor::new(MAX_CHANNEL, 0, 0);
    /// Full green
    pub const GREEN: RingColor = RingColor::new(0, MAX_CHANNEL, 0);

    /// Create a color
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// True if all channels are within 0 to [MAX_CHANNEL]
    pub fn is_valid(&self) -> bool {
        self.red <= MAX_CHANNEL && self.green <= MAX_CHANNEL && self.blue <= MAX_CHANNEL
    }
}

/// # LED ring access
///
/// Obtained from [BaseDrone::led_ring()](crate::BaseDrone::led_ring) or [Drone::led_ring()](crate::Drone::led_ring).
pub struct LedRing<'a, L: FlightLink + ?Sized> {
    link: &'a L,
    dwell: Duration,
}

impl<'a, L: FlightLink + ?Sized> LedRing<'a, L> {
    pub(crate) fn new(link: &'a L, dwell: Duration) -> Self {
        Self { link, dwell }
    }

    /// Select the ring effect. Returns `false` without writing if the effect does not exist.
    pub async fn set_effect(&self, effect: u8) -> Result<bool> {
        if effect >= RING_EFFECT_COUNT {
            warn!(
                "Could not set ring.effect to {}, use a value between 0 and {}. \
                 See https://wiki.bitcraze.io/projects:crazyflie2:expansionboards:ledring",
                effect,
                RING_EFFECT_COUNT - 1
            );
            return Ok(false);
        }

        self.link.set_param("ring.effect", effect as f64).await?;
        Ok(true)
    }

    /// Set the solid color. Returns `false` without writing if a channel is out of range.
    ///
    /// The color is only visible with the [SOLID_COLOR_EFFECT].
    pub async fn set_color(&self, color: RingColor) -> Result<bool> {
        if !color.is_valid() {
            debug!("Ignoring out of range color {:?}", color);
            return Ok(false);
        }

        self.link.set_param("ring.solidRed", color.red as f64).await?;
        self.link.set_param("ring.solidGreen", color.green as f64).await?;
        self.link.set_param("ring.solidBlue", color.blue as f64).await?;
        Ok(true)
    }

    /// Preview a sequence on the ring: red for waypoints with a negative x, green otherwise.
    ///
    /// Each color is shown for the configured dwell time.
    pub async fn red_green_color(&self, waypoints: &[Waypoint]) -> Result<()> {
        self.set_effect(SOLID_COLOR_EFFECT).await?;

        for waypoint in waypoints {
            let color = if waypoint.x < 0.0 {
                RingColor::RED
            } else {
                RingColor::GREEN
            };
            self.set_color(color).await?;
            sleep(self.dwell).await;
        }

        Ok(())
    }
}
