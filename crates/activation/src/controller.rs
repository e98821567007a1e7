//! Panel controller abstraction.
//!
//! The machine never touches windows. It produces [`PanelCommand`]s and the
//! host applies them through a [`PanelController`].

use crate::geometry::Size;
use crate::machine::ActivationMode;
use std::sync::{Arc, Mutex, PoisonError};

/// A single instruction for the window owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    Show,
    Hide,
    SetMode { mode: ActivationMode, animated: bool },
    Resize { size: Size, animated: bool },
}

/// Owner of the actual panel window.
pub trait PanelController: Send + Sync {
    fn show(&self);

    fn hide(&self);

    fn set_mode(&self, mode: ActivationMode, animated: bool);

    fn resize(&self, to: Size, animated: bool);

    /// Dispatch a command to the matching method.
    fn apply(&self, command: &PanelCommand) {
        match *command {
            PanelCommand::Show => self.show(),
            PanelCommand::Hide => self.hide(),
            PanelCommand::SetMode { mode, animated } => self.set_mode(mode, animated),
            PanelCommand::Resize { size, animated } => self.resize(size, animated),
        }
    }
}

/// Type alias for a shared controller reference.
pub type PanelControllerRef = Arc<dyn PanelController>;

/// Controller that records every command for later inspection.
#[derive(Default)]
pub struct InMemoryPanelController {
    commands: Mutex<Vec<PanelCommand>>,
}

impl InMemoryPanelController {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded commands, oldest first.
    pub fn commands(&self) -> Vec<PanelCommand> {
        self.lock().clone()
    }

    pub fn show_count(&self) -> usize {
        self.count(|c| matches!(c, PanelCommand::Show))
    }

    pub fn hide_count(&self) -> usize {
        self.count(|c| matches!(c, PanelCommand::Hide))
    }

    pub fn resize_count(&self) -> usize {
        self.count(|c| matches!(c, PanelCommand::Resize { .. }))
    }

    pub fn count(&self, predicate: impl Fn(&PanelCommand) -> bool) -> usize {
        self.lock().iter().filter(|c| predicate(c)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PanelCommand>> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, command: PanelCommand) {
        self.lock().push(command);
    }
}

impl PanelController for InMemoryPanelController {
    fn show(&self) {
        self.record(PanelCommand::Show);
    }

    fn hide(&self) {
        self.record(PanelCommand::Hide);
    }

    fn set_mode(&self, mode: ActivationMode, animated: bool) {
        self.record(PanelCommand::SetMode { mode, animated });
    }

    fn resize(&self, to: Size, animated: bool) {
        self.record(PanelCommand::Resize { size: to, animated });
    }
}

/// Controller that discards everything.
pub struct NullPanelController;

impl PanelController for NullPanelController {
    fn show(&self) {}

    fn hide(&self) {}

    fn set_mode(&self, _mode: ActivationMode, _animated: bool) {}

    fn resize(&self, _to: Size, _animated: bool) {}
}
