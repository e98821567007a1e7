//! Published, immutable view of the panel.

use perch_activation::{ActivationMode, Presence};
use perch_arbiter::MediaSnapshot;
use perch_refresh::{SignalKind, SignalState};
use serde::Serialize;
use std::collections::BTreeMap;

/// What consumers render. Produced by the decision loop only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSnapshot {
    /// Increases by one per publication.
    pub sequence: u64,
    pub mode: ActivationMode,
    pub presence: Presence,
    pub live_widget: bool,
    pub media: Option<MediaSnapshot>,
    pub artwork: Option<String>,
    pub signals: BTreeMap<SignalKind, SignalState>,
    /// Whole seconds left on a running countdown, rounded up.
    pub countdown_remaining_secs: Option<u64>,
}

impl PanelSnapshot {
    pub fn initial(mode: ActivationMode) -> Self {
        Self {
            sequence: 0,
            mode,
            presence: Presence::Hidden,
            live_widget: false,
            media: None,
            artwork: None,
            signals: BTreeMap::new(),
            countdown_remaining_secs: None,
        }
    }

    pub fn signal(&self, kind: SignalKind) -> &SignalState {
        static HIDDEN: SignalState = SignalState::Hidden;
        self.signals.get(&kind).unwrap_or(&HIDDEN)
    }

    /// Equal in everything but the sequence number.
    pub fn same_content(&self, other: &PanelSnapshot) -> bool {
        self.mode == other.mode
            && self.presence == other.presence
            && self.live_widget == other.live_widget
            && self.media == other.media
            && self.artwork == other.artwork
            && self.signals == other.signals
            && self.countdown_remaining_secs == other.countdown_remaining_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_ignores_sequence() {
        let a = PanelSnapshot::initial(ActivationMode::Collapsed);
        let mut b = a.clone();
        b.sequence = 9;
        assert!(a.same_content(&b));

        b.live_widget = true;
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_missing_signal_is_hidden() {
        let snapshot = PanelSnapshot::initial(ActivationMode::Expanded);
        assert_eq!(*snapshot.signal(SignalKind::Calendar), SignalState::Hidden);
    }
}
