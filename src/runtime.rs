use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::puzzle::PuzzleVariant;

/// Longest the loop sleeps when no countdown or refresh is pending
pub const IDLE_WAIT: Duration = Duration::from_millis(500);

/// A key press, decoded into what it asks of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Puzzle(PuzzleVariant),
    NextPuzzle,
    SelectUp,
    SelectDown,
    DeleteSelected,
    Quit,
}

impl Command {
    /// `None` for keys with no meaning and for repeat/release events, which
    /// would otherwise re-toggle the timer
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        match key.code {
            KeyCode::Char(' ') => Some(Command::Toggle),
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            KeyCode::Tab => Some(Command::NextPuzzle),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                Some(Command::Puzzle(PuzzleVariant::ALL[idx]))
            }
            KeyCode::Up => Some(Command::SelectUp),
            KeyCode::Down => Some(Command::SelectDown),
            KeyCode::Char('d') | KeyCode::Delete => Some(Command::DeleteSelected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Command(Command),
    Resize,
    /// The wait ran out: a countdown or refresh deadline has come
    Due,
}

/// Where commands come from
pub trait InputSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<TimerEvent, RecvTimeoutError>;
}

/// Reads the terminal on its own thread and forwards decoded commands
pub struct TerminalInput {
    rx: Receiver<TimerEvent>,
}

impl TerminalInput {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => match Command::from_key(key) {
                    Some(command) => tx.send(TimerEvent::Command(command)),
                    None => Ok(()),
                },
                Ok(CtEvent::Resize(_, _)) => tx.send(TimerEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    tracing::error!(error = %err, "terminal event stream closed");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl InputSource for TerminalInput {
    fn recv_timeout(&self, timeout: Duration) -> Result<TimerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed input for headless runs
pub struct ChannelInput {
    rx: Receiver<TimerEvent>,
}

impl ChannelInput {
    pub fn new(rx: Receiver<TimerEvent>) -> Self {
        Self { rx }
    }
}

impl InputSource for ChannelInput {
    fn recv_timeout(&self, timeout: Duration) -> Result<TimerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Waits for the next thing the timer must react to: a command, a resize, or
/// the deadline of its next scheduled firing.
pub struct Runner<I: InputSource> {
    input: I,
    idle_wait: Duration,
}

impl<I: InputSource> Runner<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            idle_wait: IDLE_WAIT,
        }
    }

    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Block until input arrives or `until_due` has passed.
    ///
    /// With nothing scheduled the wait is capped at the idle wait. A closed
    /// input source reads as a quit.
    pub fn step(&self, until_due: Option<Duration>) -> TimerEvent {
        let wait = until_due.map_or(self.idle_wait, |due| due.min(self.idle_wait));
        match self.input.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => TimerEvent::Due,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("input closed");
                TimerEvent::Command(Command::Quit)
            }
        }
    }
}

/// Periodic schedule that can be started and cancelled.
///
/// Holds no thread: the owner polls it with the current time and gets back how
/// many periods elapsed since the last poll. A cancelled timer never fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    period: Duration,
    next_due: Option<Duration>,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// (Re)start so the first firing is one period after `now`
    pub fn start(&mut self, now: Duration) {
        self.next_due = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// When the next firing is due, if running
    pub fn next_due(&self) -> Option<Duration> {
        self.next_due
    }

    /// Number of firings due at `now`; advances the schedule past them
    pub fn poll(&mut self, now: Duration) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };
        if self.period.is_zero() {
            return 0;
        }

        let mut fired = 0;
        while due <= now {
            fired += 1;
            due += self.period;
        }
        self.next_due = Some(due);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_decode_to_commands() {
        assert_eq!(Command::from_key(key(KeyCode::Char(' '))), Some(Command::Toggle));
        assert_eq!(
            Command::from_key(key(KeyCode::Char('3'))),
            Some(Command::Puzzle(PuzzleVariant::ThreeByThreeOneHanded))
        );
        assert_eq!(Command::from_key(key(KeyCode::Tab)), Some(Command::NextPuzzle));
        assert_eq!(Command::from_key(key(KeyCode::Delete)), Some(Command::DeleteSelected));
        assert_eq!(Command::from_key(key(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(
            Command::from_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        assert_eq!(Command::from_key(key(KeyCode::Char('5'))), None);
        assert_eq!(Command::from_key(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn repeats_and_releases_do_not_toggle() {
        let mut held = key(KeyCode::Char(' '));
        held.kind = KeyEventKind::Repeat;
        assert_eq!(Command::from_key(held), None);
        held.kind = KeyEventKind::Release;
        assert_eq!(Command::from_key(held), None);
    }

    #[test]
    fn step_reports_due_when_deadline_passes() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(ChannelInput::new(rx));

        let started = Instant::now();
        assert_eq!(runner.step(Some(Duration::from_millis(5))), TimerEvent::Due);
        // the deadline, not the idle wait, bounded the sleep
        assert!(started.elapsed() < IDLE_WAIT);
    }

    #[test]
    fn step_is_bounded_by_idle_wait() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(ChannelInput::new(rx)).with_idle_wait(Duration::from_millis(2));
        assert_eq!(runner.step(None), TimerEvent::Due);
        assert_eq!(runner.step(Some(Duration::from_secs(60))), TimerEvent::Due);
    }

    #[test]
    fn step_passes_commands_through() {
        let (tx, rx) = mpsc::channel();
        tx.send(TimerEvent::Command(Command::Toggle)).unwrap();
        let runner = Runner::new(ChannelInput::new(rx));
        assert_eq!(
            runner.step(Some(Duration::ZERO)),
            TimerEvent::Command(Command::Toggle)
        );
    }

    #[test]
    fn closed_input_quits() {
        let (tx, rx) = mpsc::channel();
        drop(tx);
        let runner = Runner::new(ChannelInput::new(rx));
        assert_eq!(runner.step(None), TimerEvent::Command(Command::Quit));
    }

    #[test]
    fn interval_reports_next_due() {
        let mut timer = IntervalTimer::new(Duration::from_millis(50));
        assert_eq!(timer.next_due(), None);
        timer.start(Duration::from_millis(20));
        assert_eq!(timer.next_due(), Some(Duration::from_millis(70)));
        timer.poll(Duration::from_millis(130));
        assert_eq!(timer.next_due(), Some(Duration::from_millis(170)));
    }

    #[test]
    fn interval_inactive_until_started() {
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        assert!(!timer.is_active());
        assert_eq!(timer.poll(Duration::from_secs(10)), 0);
    }

    #[test]
    fn interval_fires_once_per_period() {
        let mut timer = IntervalTimer::new(Duration::from_millis(50));
        timer.start(Duration::ZERO);

        assert_eq!(timer.poll(Duration::from_millis(49)), 0);
        assert_eq!(timer.poll(Duration::from_millis(50)), 1);
        assert_eq!(timer.poll(Duration::from_millis(60)), 0);
        // a late poll catches up on every missed period
        assert_eq!(timer.poll(Duration::from_millis(210)), 3);
    }

    #[test]
    fn interval_cancel_stops_firing() {
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start(Duration::ZERO);
        timer.cancel();
        assert!(!timer.is_active());
        assert_eq!(timer.poll(Duration::from_secs(5)), 0);
    }

    #[test]
    fn interval_restart_resets_phase() {
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start(Duration::ZERO);
        timer.start(Duration::from_millis(900));
        assert_eq!(timer.poll(Duration::from_millis(1_500)), 0);
        assert_eq!(timer.poll(Duration::from_millis(1_900)), 1);
    }
}
