use std::{fmt, time::Duration};

use log::{debug, info};

use crate::{
    proc::Field,
    settings::{clamp_delay, DELAY_STEP},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => f.write_str("STOPPED"),
            RunState::Running => f.write_str("RUNNING"),
        }
    }
}

/// Owns the current field and decides when it may change.
///
/// Generations advance only through [`Session::tick`] and
/// [`Session::step_once`]; the session never schedules itself.
#[derive(Debug, Clone)]
pub struct Session {
    field: Field,
    state: RunState,
    generation: u64,
    delay: u64,
}

impl Session {
    pub fn new(field: Field, delay_ms: u64) -> Self {
        Session {
            field,
            state: RunState::Stopped,
            generation: 0,
            delay: clamp_delay(delay_ms),
        }
    }

    #[inline]
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Write access for painting. Refused while running.
    #[inline]
    pub fn field_mut(&mut self) -> Option<&mut Field> {
        match self.state {
            RunState::Stopped => Some(&mut self.field),
            RunState::Running => None,
        }
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    #[inline]
    pub fn delay_ms(&self) -> u64 {
        self.delay
    }

    pub fn set_delay(&mut self, ms: u64) {
        self.delay = clamp_delay(ms);
    }

    pub fn slower(&mut self) {
        self.set_delay(self.delay + DELAY_STEP);
    }

    pub fn faster(&mut self) {
        self.set_delay(self.delay.saturating_sub(DELAY_STEP));
    }

    pub fn toggle_run(&mut self) -> RunState {
        self.state = match self.state {
            RunState::Stopped => RunState::Running,
            RunState::Running => RunState::Stopped,
        };
        info!("simulation {} at generation {}", self.state, self.generation);
        self.state
    }

    /// Advances one generation if stopped. Returns whether it did.
    pub fn step_once(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.tick();
        true
    }

    /// Advances one generation regardless of the run state.
    pub fn tick(&mut self) {
        self.field = self.field.step();
        self.generation += 1;
        debug!(
            "generation {}: {} alive",
            self.generation,
            self.field.population()
        );
    }

    /// Stops and clears the field, keeping its size.
    pub fn reset(&mut self) {
        self.state = RunState::Stopped;
        self.field = self.field.cleared();
        self.generation = 0;
        info!("field reset");
    }

    /// Stops and swaps in another field, returning the old one.
    pub fn replace(&mut self, field: Field) -> Field {
        self.state = RunState::Stopped;
        self.generation = 0;
        std::mem::replace(&mut self.field, field)
    }
}
