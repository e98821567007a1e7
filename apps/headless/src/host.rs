//! Stand-ins for the window host: a simulated screen and a logging
//! controller.

use crate::config::DisplayConfig;
use perch_activation::{
    ActivationMode, DisplayInfo, PanelController, Point, PointerSample, ScreenProvider, Size,
};
use std::sync::{Mutex, PoisonError};

/// One display with a pointer moved by stdin commands.
pub struct SimulatedScreen {
    display: DisplayInfo,
    pointer: Mutex<PointerSample>,
}

impl SimulatedScreen {
    pub fn new(config: &DisplayConfig) -> Self {
        let mut display = DisplayInfo::new(config.id, config.frame).main();
        if let Some(notch) = config.notch {
            display = display.with_notch(notch);
        }
        // Start well away from the activation zone.
        let pointer = PointerSample::at(config.frame.mid_x(), config.frame.max_y() - 1.0);
        Self {
            display,
            pointer: Mutex::new(pointer),
        }
    }

    pub fn set_pointer(&self, position: Point, buttons_down: bool) {
        let mut pointer = self.pointer.lock().unwrap_or_else(PoisonError::into_inner);
        *pointer = PointerSample {
            position,
            buttons_down,
        };
    }

    /// Centre of the activation zone.
    pub fn zone_point(&self) -> Point {
        match self.display.notch {
            Some(notch) => Point::new(notch.mid_x(), notch.min_y() + 1.0),
            None => Point::new(self.display.frame.mid_x(), self.display.frame.min_y() + 1.0),
        }
    }

    /// A point on the display far from the panel.
    pub fn away_point(&self) -> Point {
        Point::new(self.display.frame.mid_x(), self.display.frame.max_y() - 1.0)
    }
}

impl ScreenProvider for SimulatedScreen {
    fn pointer(&self) -> PointerSample {
        *self.pointer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn displays(&self) -> Vec<DisplayInfo> {
        vec![self.display.clone()]
    }
}

/// Logs every command instead of driving a window.
pub struct LoggingPanelController;

impl PanelController for LoggingPanelController {
    fn show(&self) {
        tracing::info!("panel show");
    }

    fn hide(&self) {
        tracing::info!("panel hide");
    }

    fn set_mode(&self, mode: ActivationMode, animated: bool) {
        tracing::info!(%mode, animated, "panel mode");
    }

    fn resize(&self, to: Size, animated: bool) {
        tracing::info!(width = to.width, height = to.height, animated, "panel resize");
    }
}
