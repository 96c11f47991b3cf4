use crate::puzzle::PuzzleVariant;
use crate::runtime::IntervalTimer;
use std::time::Duration;

pub const DEFAULT_INSPECTION_SECS: u32 = 15;
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);
pub const REFRESH_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Inspecting { remaining_secs: u32 },
    Timing { started_at: Duration },
}

/// What a call to `tick` changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub countdown_changed: bool,
    pub timing_started: bool,
    pub display_refreshed: bool,
}

impl TickOutcome {
    pub fn needs_redraw(&self) -> bool {
        self.countdown_changed || self.timing_started || self.display_refreshed
    }
}

/// Transient per-variant timer: state, pending scramble and the two schedules
/// (1s inspection countdown, 50ms display refresh) that only run while their
/// state is active.
#[derive(Debug)]
pub struct TimerSession {
    variant: PuzzleVariant,
    state: TimerState,
    inspection_secs: u32,
    elapsed_display: Option<u64>,
    scramble: String,
    countdown: IntervalTimer,
    refresh: IntervalTimer,
}

impl TimerSession {
    pub fn new(variant: PuzzleVariant, scramble: String, inspection_secs: u32) -> Self {
        Self {
            variant,
            state: TimerState::Idle,
            inspection_secs,
            elapsed_display: None,
            scramble,
            countdown: IntervalTimer::new(COUNTDOWN_PERIOD),
            refresh: IntervalTimer::new(REFRESH_PERIOD),
        }
    }

    pub fn variant(&self) -> PuzzleVariant {
        self.variant
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn scramble(&self) -> &str {
        &self.scramble
    }

    pub fn inspection_secs(&self) -> u32 {
        self.inspection_secs
    }

    /// Last elapsed reading shown to the user, `None` when cleared
    pub fn elapsed_display(&self) -> Option<u64> {
        self.elapsed_display
    }

    pub fn is_idle(&self) -> bool {
        self.state == TimerState::Idle
    }

    pub fn is_timing(&self) -> bool {
        matches!(self.state, TimerState::Timing { .. })
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown.is_active()
    }

    pub fn refresh_active(&self) -> bool {
        self.refresh.is_active()
    }

    /// Idle -> Inspecting, or straight to Timing when inspection is disabled
    pub fn begin_inspection(&mut self, now: Duration) {
        if self.state != TimerState::Idle {
            return;
        }
        self.elapsed_display = None;
        if self.inspection_secs == 0 {
            self.start_timing(now);
            return;
        }
        self.state = TimerState::Inspecting {
            remaining_secs: self.inspection_secs,
        };
        self.countdown.start(now);
        tracing::debug!(variant = %self.variant, secs = self.inspection_secs, "inspection started");
    }

    /// Enter Timing at `now`; ends any inspection in progress
    pub fn start_timing(&mut self, now: Duration) {
        self.countdown.cancel();
        self.state = TimerState::Timing { started_at: now };
        self.elapsed_display = Some(0);
        self.refresh.start(now);
        tracing::debug!(variant = %self.variant, "timing started");
    }

    /// Authoritative elapsed time of the running attempt.
    ///
    /// Stops the display refresh and freezes the reading, but leaves the state
    /// in Timing until `complete` so the solve can be finalized first.
    pub fn stop(&mut self, now: Duration) -> Option<u64> {
        let TimerState::Timing { started_at } = self.state else {
            return None;
        };
        self.refresh.cancel();
        let elapsed = now.saturating_sub(started_at).as_millis() as u64;
        self.elapsed_display = Some(elapsed);
        Some(elapsed)
    }

    /// Return to Idle with the scramble for the next attempt
    pub fn complete(&mut self, next_scramble: String) {
        self.cancel_timers();
        self.state = TimerState::Idle;
        self.scramble = next_scramble;
    }

    /// Advance the schedules to `now`
    pub fn tick(&mut self, now: Duration) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if let TimerState::Inspecting { remaining_secs } = self.state {
            let first_due = self.countdown.next_due();
            let fired = self.countdown.poll(now);
            if fired > 0 {
                let remaining = remaining_secs.saturating_sub(fired);
                outcome.countdown_changed = true;
                if remaining == 0 {
                    // timing begins when the last second ran out, however late this poll is
                    let expired_at = first_due.map_or(now, |due| {
                        due + self.countdown.period() * remaining_secs.saturating_sub(1)
                    });
                    self.start_timing(expired_at);
                    outcome.timing_started = true;
                } else {
                    self.state = TimerState::Inspecting {
                        remaining_secs: remaining,
                    };
                }
            }
        }

        if let TimerState::Timing { started_at } = self.state {
            if self.refresh.poll(now) > 0 {
                self.elapsed_display = Some(now.saturating_sub(started_at).as_millis() as u64);
                outcome.display_refreshed = true;
            }
        }

        outcome
    }

    /// Earliest deadline among the running schedules
    pub fn next_due(&self) -> Option<Duration> {
        match (self.countdown.next_due(), self.refresh.next_due()) {
            (Some(countdown), Some(refresh)) => Some(countdown.min(refresh)),
            (countdown, refresh) => countdown.or(refresh),
        }
    }

    /// Stop both schedules; used on state exit and teardown
    pub fn cancel_timers(&mut self) {
        self.countdown.cancel();
        self.refresh.cancel();
    }
}
