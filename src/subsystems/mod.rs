//! # Pilot subsystems
//!
//! The pilot uses a handful of Crazyflie subsystems through the [FlightLink](crate::link::FlightLink). The
//! parts with their own logic live here: the wait for the position estimator to converge and the LED ring deck.

pub mod estimator;
pub mod led_ring;
