use crate::clock::Clock;
use crate::puzzle::PuzzleVariant;
use crate::scramble::Scrambler;
use crate::session::SolveSession;
use crate::solve::{SolveId, SolveRecord};
use crate::timer::{TickOutcome, TimerSession, TimerState};
use std::time::Duration;

/// Drives one timer screen: routes toggles and ticks into the state machine
/// and finalizes solves into the session.
pub struct TimerController<C: Clock> {
    clock: C,
    scrambler: Scrambler,
    timer: TimerSession,
    session: SolveSession,
    disposed: bool,
}

impl<C: Clock> TimerController<C> {
    pub fn new(
        clock: C,
        session: SolveSession,
        mut scrambler: Scrambler,
        inspection_secs: u32,
    ) -> Self {
        let variant = session.variant();
        let timer = TimerSession::new(variant, scrambler.generate(variant), inspection_secs);
        Self {
            clock,
            scrambler,
            timer,
            session,
            disposed: false,
        }
    }

    pub fn timer(&self) -> &TimerSession {
        &self.timer
    }

    pub fn session(&self) -> &SolveSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SolveSession {
        &mut self.session
    }

    pub fn variant(&self) -> PuzzleVariant {
        self.session.variant()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The single user input. Returns the finished solve when this toggle stopped timing.
    pub fn toggle(&mut self) -> Option<SolveRecord> {
        if self.disposed {
            return None;
        }
        let now = self.clock.now();

        match self.timer.state() {
            TimerState::Idle => {
                self.timer.begin_inspection(now);
                None
            }
            TimerState::Inspecting { remaining_secs } => {
                tracing::debug!(remaining_secs, "inspection ended early");
                self.timer.start_timing(now);
                None
            }
            TimerState::Timing { .. } => self.finish_solve(now),
        }
    }

    fn finish_solve(&mut self, now: Duration) -> Option<SolveRecord> {
        let elapsed = self.timer.stop(now)?;
        let record = self
            .session
            .record_solve(elapsed, self.timer.scramble().to_string());
        let next = self.scrambler.generate(self.variant());
        self.timer.complete(next);
        Some(record)
    }

    /// Advance countdown and refresh schedules to the current time
    pub fn tick(&mut self) -> TickOutcome {
        if self.disposed {
            return TickOutcome::default();
        }
        self.session.collect_remote_refs();
        let now = self.clock.now();
        self.timer.tick(now)
    }

    /// How long until the next countdown step or display refresh is due.
    ///
    /// `None` while idle: nothing happens until the next toggle.
    pub fn until_due(&self) -> Option<Duration> {
        if self.disposed {
            return None;
        }
        let due = self.timer.next_due()?;
        Some(due.saturating_sub(self.clock.now()))
    }

    /// Replace the timer with a fresh one for `variant`.
    ///
    /// An attempt in progress is abandoned without recording a solve.
    pub fn switch_variant(&mut self, variant: PuzzleVariant) {
        if self.disposed || variant == self.variant() {
            return;
        }
        if !self.timer.is_idle() {
            tracing::info!(from = %self.variant(), to = %variant, "attempt abandoned by puzzle switch");
        }
        self.timer.cancel_timers();
        self.session.switch_variant(variant);
        self.timer = TimerSession::new(
            variant,
            self.scrambler.generate(variant),
            self.timer.inspection_secs(),
        );
    }

    pub fn delete_solve(&mut self, id: SolveId) -> Option<SolveRecord> {
        self.session.delete_solve(id)
    }

    /// Cancel all schedules; further input is ignored
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.timer.cancel_timers();
        self.disposed = true;
        tracing::debug!("timer controller disposed");
    }
}

impl<C: Clock> Drop for TimerController<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}
