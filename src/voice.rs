//! # Voice commands
//!
//! Flies the drone from spoken commands. Speech recognition itself is done outside of this crate: a
//! [CommandSource] provides the transcribed phrases, for example [LineCommandSource] reading one phrase per line
//! from the output of a speech-to-text tool piped into stdin.
//!
//! | Phrase  | Action                                           |
//! |---------|--------------------------------------------------|
//! | `start` | Fly to (0, 0, 0.2), relative to the initial pose |
//! | `left`  | Fly to (0, -1, 0.2), relative                    |
//! | `stop`  | Land and end the session                         |

use async_trait::async_trait;
use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::drone::Drone;
use crate::link::FlightLink;
use crate::pose::{Frame, Waypoint};
use crate::Result;

/// # Recognized command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Take off and hover above the start position
    Start,
    /// Move one meter to the left
    Left,
    /// Land and end the session
    Stop,
}

impl VoiceCommand {
    /// Match a phrase, ignoring case and surrounding whitespace
    pub fn parse(phrase: &str) -> Option<Self> {
        match phrase.trim().to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "left" => Some(Self::Left),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Point flown to, relative to the initial pose. `None` for [VoiceCommand::Stop].
    pub fn target(&self) -> Option<Waypoint> {
        match self {
            Self::Start => Some(Waypoint::new(0.0, 0.0, 0.2)),
            Self::Left => Some(Waypoint::new(0.0, -1.0, 0.2)),
            Self::Stop => None,
        }
    }
}

/// # Source of transcribed phrases
#[async_trait(?Send)]
pub trait CommandSource {
    /// Wait for the next phrase. `None` once the source is exhausted.
    async fn next_phrase(&mut self) -> Result<Option<String>>;
}

/// # One phrase per line
///
/// Lines that are not valid UTF-8 are decoded lossily, so a garbled transcription is reported as an unknown
/// phrase instead of ending the session.
pub struct LineCommandSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineCommandSource<R> {
    /// Read phrases from a buffered reader, for example `BufReader::new(tokio::io::stdin())`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

#[async_trait(?Send)]
impl<R: AsyncBufRead + Unpin> CommandSource for LineCommandSource<R> {
    async fn next_phrase(&mut self) -> Result<Option<String>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }

            let line = String::from_utf8_lossy(&self.buf);
            let phrase = line.trim();
            if !phrase.is_empty() {
                return Ok(Some(phrase.to_owned()));
            }
        }
    }
}

/// Execute voice commands until `stop` is heard
///
/// Unrecognized phrases are ignored. If the source is exhausted before `stop`, the drone lands anyway.
pub async fn run_voice_session<L, S>(drone: &Drone<L>, source: &mut S) -> Result<()>
where
    L: FlightLink,
    S: CommandSource + ?Sized,
{
    loop {
        info!("Say something!");
        let Some(phrase) = source.next_phrase().await? else {
            warn!("No more commands, landing");
            return drone.land().await;
        };
        info!("Heard \"{}\"", phrase.trim());

        match VoiceCommand::parse(&phrase) {
            Some(VoiceCommand::Stop) => {
                drone.land().await?;
                info!("Stop command received, session ended");
                return Ok(());
            }
            Some(command) => {
                if let Some(target) = command.target() {
                    drone.fly_to_point(target, None, Frame::Relative).await?;
                }
            }
            None => warn!("Unknown command \"{}\"", phrase.trim()),
        }
    }
}
