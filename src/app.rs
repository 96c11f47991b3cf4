use std::time::Duration;

use crate::clock::Clock;
use crate::controller::TimerController;
use crate::puzzle::PuzzleVariant;
use crate::runtime::Command;
use crate::solve::SolveRecord;

/// What the event loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Redraw,
    Quit,
}

/// Screen state on top of the timer controller: the last finished solve and
/// the row highlighted in the history list.
pub struct App<C: Clock> {
    pub controller: TimerController<C>,
    pub last_solve: Option<SolveRecord>,
    pub selected: Option<usize>,
}

impl<C: Clock> App<C> {
    pub fn new(controller: TimerController<C>) -> Self {
        Self {
            controller,
            last_solve: None,
            selected: None,
        }
    }

    pub fn selected_record(&self) -> Option<&SolveRecord> {
        self.selected
            .and_then(|idx| self.controller.session().history().get(idx))
    }

    pub fn on_command(&mut self, command: Command) -> Outcome {
        match command {
            Command::Quit => Outcome::Quit,
            Command::Toggle => {
                if let Some(record) = self.controller.toggle() {
                    self.last_solve = Some(record);
                    self.selected = None;
                }
                Outcome::Redraw
            }
            Command::NextPuzzle => {
                let next = self.controller.variant().next();
                self.switch_variant(next);
                Outcome::Redraw
            }
            Command::Puzzle(variant) => {
                self.switch_variant(variant);
                Outcome::Redraw
            }
            Command::SelectDown => {
                self.select_down();
                Outcome::Redraw
            }
            Command::SelectUp => {
                self.select_up();
                Outcome::Redraw
            }
            Command::DeleteSelected => {
                if self.delete_selected() {
                    Outcome::Redraw
                } else {
                    Outcome::Ignored
                }
            }
        }
    }

    /// How long the event loop may wait before the timer needs a tick
    pub fn until_due(&self) -> Option<Duration> {
        self.controller.until_due()
    }

    /// Advance the timer; true when the screen changed
    pub fn on_tick(&mut self) -> bool {
        self.controller.tick().needs_redraw()
    }

    fn switch_variant(&mut self, variant: PuzzleVariant) {
        if variant == self.controller.variant() {
            return;
        }
        self.controller.switch_variant(variant);
        self.last_solve = None;
        self.selected = None;
    }

    fn select_down(&mut self) {
        let len = self.controller.session().history().len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            None => 0,
            Some(idx) => (idx + 1).min(len - 1),
        });
    }

    fn select_up(&mut self) {
        self.selected = match self.selected {
            None | Some(0) => None,
            Some(idx) => Some(idx - 1),
        };
    }

    fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selected_record().map(|r| r.id) else {
            return false;
        };
        if self.controller.delete_solve(id).is_none() {
            return false;
        }
        if self.last_solve.as_ref().map(|r| r.id) == Some(id) {
            self.last_solve = None;
        }

        let len = self.controller.session().history().len();
        self.selected = match self.selected {
            _ if len == 0 => None,
            Some(idx) => Some(idx.min(len - 1)),
            None => None,
        };
        true
    }
}
