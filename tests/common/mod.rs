// In-memory FlightLink recording every command it receives

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use crazyflie_pilot::{Error, FlightLink, Result, VarianceSample, VarianceStream};
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Param(String, f64),
    Position(f32, f32, f32, f32),
    Stop,
    NotifyStop(u32),
    OpenStream(Duration),
    StopStream,
    Close,
}

#[derive(Default)]
struct State {
    commands: Vec<Command>,
    timestamps: Vec<Instant>,
    samples: VecDeque<VarianceSample>,
    steady: Option<VarianceSample>,
}

/// Clones share the same recording
#[derive(Clone, Default)]
pub struct RecordingLink {
    state: Rc<RefCell<State>>,
}

pub fn converged() -> VarianceSample {
    VarianceSample::new(0.0001, 0.0001, 0.0001)
}

pub fn noisy(i: usize) -> VarianceSample {
    let v = 0.01 * (i % 2) as f64;
    VarianceSample::new(v, v, v)
}

impl RecordingLink {
    /// Link whose variance stream converges immediately
    pub fn converging() -> Self {
        Self::with_samples(Vec::new(), Some(converged()))
    }

    /// Stream `samples`, then repeat `steady` forever. Without `steady` the stream ends in a disconnection.
    pub fn with_samples(samples: Vec<VarianceSample>, steady: Option<VarianceSample>) -> Self {
        let link = Self::default();
        {
            let mut state = link.state.borrow_mut();
            state.samples = samples.into();
            state.steady = steady;
        }
        link
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Commands paired with the time they were received
    pub fn timed_commands(&self) -> Vec<(Instant, Command)> {
        let state = self.state.borrow();
        state.timestamps.iter().copied().zip(state.commands.iter().cloned()).collect()
    }

    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.commands.clear();
        state.timestamps.clear();
    }

    pub fn positions(&self) -> Vec<(f32, f32, f32, f32)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::Position(x, y, z, yaw) => Some((x, y, z, yaw)),
                _ => None,
            })
            .collect()
    }

    pub fn params(&self) -> Vec<(String, f64)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::Param(name, value) => Some((name, value)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, command: Command) {
        let mut state = self.state.borrow_mut();
        state.commands.push(command);
        state.timestamps.push(Instant::now());
    }
}

#[async_trait(?Send)]
impl FlightLink for RecordingLink {
    async fn set_param(&self, name: &str, value: f64) -> Result<()> {
        self.record(Command::Param(name.to_owned(), value));
        Ok(())
    }

    async fn send_position_setpoint(&self, x: f32, y: f32, z: f32, yaw: f32) -> Result<()> {
        self.record(Command::Position(x, y, z, yaw));
        Ok(())
    }

    async fn send_stop_setpoint(&self) -> Result<()> {
        self.record(Command::Stop);
        Ok(())
    }

    async fn notify_setpoint_stop(&self, remain_valid_milliseconds: u32) -> Result<()> {
        self.record(Command::NotifyStop(remain_valid_milliseconds));
        Ok(())
    }

    async fn open_variance_stream(&self, period: Duration) -> Result<Box<dyn VarianceStream>> {
        self.record(Command::OpenStream(period));
        Ok(Box::new(ScriptedStream {
            link: self.clone(),
            period,
            stopped: false,
        }))
    }

    async fn close(&self) {
        self.record(Command::Close);
    }
}

struct ScriptedStream {
    link: RecordingLink,
    period: Duration,
    stopped: bool,
}

#[async_trait(?Send)]
impl VarianceStream for ScriptedStream {
    async fn next_sample(&mut self) -> Result<VarianceSample> {
        if self.stopped {
            return Err(Error::Disconnected);
        }
        sleep(self.period).await;

        let mut state = self.link.state.borrow_mut();
        match state.samples.pop_front() {
            Some(sample) => Ok(sample),
            None => state.steady.ok_or(Error::Disconnected),
        }
    }

    async fn stop(&mut self) -> Result<()> {
        self.stopped = true;
        self.link.record(Command::StopStream);
        Ok(())
    }
}
