//! Activation state machine.
//!
//! Pure decision logic: the caller supplies the current instant, the pointer
//! sample and the resolved target display, and applies the returned
//! [`PanelCommand`]s. The machine owns two deadlines, the pending collapse
//! and the deferred hide; [`ActivationMachine::next_deadline`] tells the
//! caller when to wake up for them.

use crate::config::ActivationConfig;
use crate::controller::PanelCommand;
use crate::display::{DisplayInfo, PointerSample};
use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Whether the panel is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    #[default]
    Collapsed,
    Expanded,
}

impl ActivationMode {
    pub fn label(&self) -> &'static str {
        match self {
            ActivationMode::Collapsed => "Collapsed",
            ActivationMode::Expanded => "Expanded",
        }
    }
}

impl std::fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What the panel window is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Window hidden.
    Hidden,
    /// Small persistent indicator for a live widget.
    Minimal,
    /// Full panel (expanded, or animating out of expanded).
    Full,
}

/// A scheduled "collapse unless cancelled" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCollapse {
    id: u64,
    deadline: Instant,
}

impl PendingCollapse {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerRegion {
    /// Inside the activation zone or the (grown) panel bounds.
    Hover,
    /// On the target display, outside both zones.
    Outside,
    /// Off the target display entirely.
    Away,
}

/// Hover-driven expand/collapse state machine.
pub struct ActivationMachine {
    config: ActivationConfig,
    mode: ActivationMode,
    presence: Presence,
    live_widget: bool,
    pending: Option<PendingCollapse>,
    deferred_hide: Option<Instant>,
    next_pending_id: u64,
    arm_count: u64,
}

impl ActivationMachine {
    pub fn new(config: ActivationConfig, initial: ActivationMode) -> Self {
        let presence = match initial {
            ActivationMode::Expanded => Presence::Full,
            ActivationMode::Collapsed => Presence::Hidden,
        };

        Self {
            config,
            mode: initial,
            presence,
            live_widget: false,
            pending: None,
            deferred_hide: None,
            next_pending_id: 1,
            arm_count: 0,
        }
    }

    pub fn mode(&self) -> ActivationMode {
        self.mode
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn is_live_widget(&self) -> bool {
        self.live_widget
    }

    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    pub fn pending_collapse(&self) -> Option<&PendingCollapse> {
        self.pending.as_ref()
    }

    /// Total number of collapse timers ever armed (including reschedules).
    pub fn arm_count(&self) -> u64 {
        self.arm_count
    }

    /// Earliest instant at which [`Self::poll_timers`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.pending.map(|p| p.deadline), self.deferred_hide) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Replace the configuration. Armed timers keep their deadlines.
    pub fn set_config(&mut self, config: ActivationConfig) {
        self.config = config;
    }

    /// Commands that bring a fresh window in line with the initial state.
    pub fn initial_commands(&self) -> Vec<PanelCommand> {
        match self.mode {
            ActivationMode::Expanded => vec![
                PanelCommand::Show,
                PanelCommand::SetMode {
                    mode: ActivationMode::Expanded,
                    animated: false,
                },
                PanelCommand::Resize {
                    size: self.config.expanded_size,
                    animated: false,
                },
            ],
            ActivationMode::Collapsed => vec![
                PanelCommand::SetMode {
                    mode: ActivationMode::Collapsed,
                    animated: false,
                },
                PanelCommand::Hide,
            ],
        }
    }

    /// The rectangle whose hover triggers expansion.
    pub fn activation_zone(&self, display: &DisplayInfo) -> Rect {
        display
            .notch
            .unwrap_or_else(|| display.frame.top_center(self.config.zone_size))
    }

    /// Current panel bounds on `display`, before the hover margin.
    pub fn panel_bounds(&self, display: &DisplayInfo) -> Option<Rect> {
        let size = match (self.mode, self.presence) {
            (ActivationMode::Expanded, _) => self.config.expanded_size,
            (ActivationMode::Collapsed, Presence::Full) => self.config.collapsed_size,
            (ActivationMode::Collapsed, Presence::Minimal) => self.config.minimal_size,
            (ActivationMode::Collapsed, Presence::Hidden) => return None,
        };
        Some(display.frame.top_center(size))
    }

    /// Evaluate one sampling tick, then fire any timers that are due.
    ///
    /// `display` is the resolved target display. Without one the machine
    /// takes no action at all.
    pub fn sample(
        &mut self,
        now: Instant,
        pointer: PointerSample,
        display: Option<&DisplayInfo>,
    ) -> Vec<PanelCommand> {
        let Some(display) = display else {
            return Vec::new();
        };

        let mut commands = Vec::new();

        match self.region(pointer.position, display) {
            PointerRegion::Hover => {
                self.cancel_pending();
                if self.mode == ActivationMode::Collapsed {
                    self.expand(&mut commands);
                }
            }
            PointerRegion::Away | PointerRegion::Outside => {
                if self.mode == ActivationMode::Expanded {
                    self.arm(now);
                }
            }
        }

        self.fire_due(now, pointer, display, &mut commands);
        commands
    }

    /// Fire timers that are due at `now` without evaluating a regular tick.
    pub fn poll_timers(
        &mut self,
        now: Instant,
        pointer: PointerSample,
        display: Option<&DisplayInfo>,
    ) -> Vec<PanelCommand> {
        let Some(display) = display else {
            return Vec::new();
        };

        let mut commands = Vec::new();
        self.fire_due(now, pointer, display, &mut commands);
        commands
    }

    /// Set the live widget flag. While collapsed and settled this toggles
    /// the minimal indicator.
    pub fn set_live_widget(&mut self, active: bool) -> Vec<PanelCommand> {
        if self.live_widget == active {
            return Vec::new();
        }
        self.live_widget = active;
        tracing::debug!(active, "live widget changed");

        if self.mode != ActivationMode::Collapsed || self.deferred_hide.is_some() {
            return Vec::new();
        }

        match (active, self.presence) {
            (true, Presence::Hidden) => {
                self.presence = Presence::Minimal;
                vec![
                    PanelCommand::Show,
                    PanelCommand::Resize {
                        size: self.config.minimal_size,
                        animated: false,
                    },
                ]
            }
            (false, Presence::Minimal) => {
                self.presence = Presence::Hidden;
                vec![PanelCommand::Hide]
            }
            _ => Vec::new(),
        }
    }

    fn region(&self, pointer: Point, display: &DisplayInfo) -> PointerRegion {
        if !display.frame.contains(pointer) {
            return PointerRegion::Away;
        }

        let in_zone = self.activation_zone(display).contains(pointer);
        let in_panel = self
            .panel_bounds(display)
            .map(|bounds| bounds.grow(self.config.hover_margin).contains(pointer))
            .unwrap_or(false);

        if in_zone || in_panel {
            PointerRegion::Hover
        } else {
            PointerRegion::Outside
        }
    }

    fn expand(&mut self, commands: &mut Vec<PanelCommand>) {
        let previous = self.mode;
        self.mode = ActivationMode::Expanded;
        self.deferred_hide = None;
        tracing::debug!(from = %previous, to = %self.mode, "activation mode changed");

        if self.presence == Presence::Hidden {
            commands.push(PanelCommand::Show);
        }
        self.presence = Presence::Full;

        commands.push(PanelCommand::SetMode {
            mode: ActivationMode::Expanded,
            animated: true,
        });
        commands.push(PanelCommand::Resize {
            size: self.config.expanded_size,
            animated: true,
        });
    }

    /// Arm a pending collapse unless one is already pending.
    fn arm(&mut self, now: Instant) {
        if self.pending.is_some() {
            return;
        }
        self.schedule_collapse(now);
    }

    /// Replace any pending collapse with a fresh one.
    fn schedule_collapse(&mut self, now: Instant) {
        let pending = PendingCollapse {
            id: self.next_pending_id,
            deadline: now + self.config.collapse_delay(),
        };
        self.next_pending_id += 1;
        self.arm_count += 1;

        if let Some(previous) = self.pending.replace(pending) {
            tracing::trace!(previous = previous.id, "pending collapse replaced");
        }
        tracing::trace!(id = pending.id, "pending collapse armed");
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::trace!(id = pending.id, "pending collapse cancelled");
        }
    }

    fn fire_due(
        &mut self,
        now: Instant,
        pointer: PointerSample,
        display: &DisplayInfo,
        commands: &mut Vec<PanelCommand>,
    ) {
        if let Some(pending) = self.pending {
            if now >= pending.deadline {
                self.pending = None;
                self.fire_collapse(now, pointer, display, commands);
            }
        }

        if let Some(deadline) = self.deferred_hide {
            if now >= deadline {
                self.deferred_hide = None;
                self.settle_collapsed(commands);
            }
        }
    }

    fn fire_collapse(
        &mut self,
        now: Instant,
        pointer: PointerSample,
        display: &DisplayInfo,
        commands: &mut Vec<PanelCommand>,
    ) {
        if self.mode != ActivationMode::Expanded {
            return;
        }

        if self.region(pointer.position, display) == PointerRegion::Hover {
            tracing::trace!("pointer returned, collapse aborted");
            return;
        }

        // Never collapse in the middle of a drag out of the panel.
        if pointer.buttons_down {
            tracing::trace!("mouse button held, collapse rescheduled");
            self.schedule_collapse(now);
            return;
        }

        let previous = self.mode;
        self.mode = ActivationMode::Collapsed;
        tracing::debug!(from = %previous, to = %self.mode, "activation mode changed");
        commands.push(PanelCommand::SetMode {
            mode: ActivationMode::Collapsed,
            animated: true,
        });
        commands.push(PanelCommand::Resize {
            size: self.config.collapsed_size,
            animated: true,
        });
        self.deferred_hide = Some(now + self.config.collapse_animation());
    }

    /// Runs once the exit animation has had time to play.
    fn settle_collapsed(&mut self, commands: &mut Vec<PanelCommand>) {
        if self.mode != ActivationMode::Collapsed {
            return;
        }

        if self.live_widget {
            if self.presence == Presence::Hidden {
                commands.push(PanelCommand::Show);
            }
            self.presence = Presence::Minimal;
            commands.push(PanelCommand::Resize {
                size: self.config.minimal_size,
                animated: true,
            });
        } else {
            self.presence = Presence::Hidden;
            commands.push(PanelCommand::Hide);
        }
    }
}
