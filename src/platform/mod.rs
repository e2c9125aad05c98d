//! Platform abstraction layer
//!
//! The simulation never schedules itself. A host supplies a
//! [`FrameScheduler`] (requestAnimationFrame in the browser, a
//! [`ManualScheduler`] in tests) and calls [`Driver::frame`] from its
//! callback. The driver runs exactly one tick per callback and asks for the
//! next one only while running.

use serde::Serialize;

use crate::consts::{FRAME_DT, MAX_FRAME_DT};
use crate::sim::{Action, SimState, TickInput, apply_input, tick};

/// Host hook that arranges one more call to [`Driver::frame`]
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Scheduler for tests and headless runs: remembers that a frame was asked for
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pending: bool,
    requests: u64,
}

impl ManualScheduler {
    /// Consume the pending request, if any
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Total requests since creation
    #[inline]
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requests += 1;
    }
}

/// Loop state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LoopState {
    /// Nothing scheduled yet (waiting for a trigger)
    #[default]
    Idle,
    /// One frame is always scheduled
    Running,
    /// Stopped on request; `start` resumes
    Stopped,
}

/// Owns the simulation and paces it with the host's frame callbacks
#[derive(Debug)]
pub struct Driver<S: FrameScheduler> {
    state: SimState,
    scheduler: S,
    loop_state: LoopState,
    stop_requested: bool,
    pending: TickInput,
    /// Host timestamp (ms) of the previous frame
    last_time: Option<f64>,
}

impl<S: FrameScheduler> Driver<S> {
    /// Wrap a loaded scenario. Scenarios that auto-start begin running at once.
    pub fn new(state: SimState, scheduler: S) -> Self {
        let mut driver = Self {
            state,
            scheduler,
            loop_state: LoopState::Idle,
            stop_requested: false,
            pending: TickInput::default(),
            last_time: None,
        };
        if driver.state.scenario.auto_start() {
            driver.start();
        }
        driver
    }

    #[inline]
    pub fn state(&self) -> &SimState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    #[inline]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[inline]
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    #[inline]
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn start(&mut self) {
        if self.loop_state == LoopState::Running {
            self.stop_requested = false;
            return;
        }
        log::info!("Loop {:?} -> Running ({})", self.loop_state, self.state.scenario.title());
        self.loop_state = LoopState::Running;
        self.stop_requested = false;
        self.last_time = None;
        self.scheduler.request_frame();
    }

    /// Stop after the tick in flight; takes effect at the top of the next frame
    pub fn stop(&mut self) {
        if self.loop_state == LoopState::Running {
            self.stop_requested = true;
        }
    }

    /// Hand over user input. While running it is applied before the next
    /// tick; otherwise it is applied right away.
    pub fn queue(&mut self, input: TickInput) {
        if input.is_empty() {
            return;
        }
        let starts = input
            .actions
            .iter()
            .any(|a| matches!(a, Action::StartSpill | Action::TriggerTsunami));
        if starts && !self.state.scenario.auto_start() {
            self.start();
        }
        if self.loop_state == LoopState::Running {
            self.pending.merge(input);
        } else {
            apply_input(&mut self.state, &input);
        }
    }

    /// Swap in a freshly loaded scenario
    pub fn load(&mut self, state: SimState) {
        self.state = state;
        self.pending = TickInput::default();
        self.last_time = None;
        if self.state.scenario.auto_start() {
            self.start();
        } else if self.loop_state == LoopState::Running {
            // The frame already scheduled will see this and not reschedule
            log::info!("Loop Running -> Idle ({})", self.state.scenario.title());
            self.loop_state = LoopState::Idle;
            self.stop_requested = false;
        }
    }

    /// Host frame callback. `now_ms` is the host timestamp in milliseconds.
    /// Returns whether a tick ran.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if self.loop_state != LoopState::Running {
            return false;
        }
        if self.stop_requested {
            self.stop_requested = false;
            self.loop_state = LoopState::Stopped;
            log::info!("Loop Running -> Stopped ({})", self.state.scenario.title());
            return false;
        }

        let dt = match self.last_time {
            Some(prev) => (((now_ms - prev) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => FRAME_DT,
        };
        self.last_time = Some(now_ms);

        let input = std::mem::take(&mut self.pending);
        tick(&mut self.state, &input, dt);

        // A finished tsunami has nothing left to animate
        if self.state.scenario == crate::sim::Scenario::Tsunami && !self.state.tsunami.is_active() {
            self.stop_requested = true;
        }

        self.scheduler.request_frame();
        true
    }
}
