//! Artwork resolution keyed by media identity.
//!
//! Artwork arrives after the snapshot it belongs to. The tracker hands out a
//! cancellation token per identity and refuses late results once the
//! identity has moved on, so artwork for track A never lands on track B.

use crate::snapshot::{MediaIdentity, MediaSnapshot};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolves artwork for a snapshot that did not carry its own.
#[async_trait]
pub trait ArtworkResolver: Send + Sync {
    async fn resolve(&self, snapshot: &MediaSnapshot, cancel: &CancellationToken) -> Option<String>;
}

pub type ArtworkResolverRef = Arc<dyn ArtworkResolver>;

/// Resolver that never finds anything.
pub struct NullArtworkResolver;

#[async_trait]
impl ArtworkResolver for NullArtworkResolver {
    async fn resolve(&self, _snapshot: &MediaSnapshot, _cancel: &CancellationToken) -> Option<String> {
        None
    }
}

/// What the caller should do after [`ArtworkTracker::observe`].
#[derive(Debug, Clone)]
pub enum ArtworkAction {
    /// Start a fetch for this identity; abandon it when `cancel` fires.
    Fetch {
        identity: MediaIdentity,
        cancel: CancellationToken,
    },
    /// Identity unchanged or artwork already known.
    Keep,
    /// Media went away; any in-flight fetch was cancelled.
    Cleared,
}

#[derive(Debug)]
struct Current {
    identity: MediaIdentity,
    artwork: Option<String>,
    cancel: Option<CancellationToken>,
}

/// Tracks the identity artwork is being resolved for.
#[derive(Debug, Default)]
pub struct ArtworkTracker {
    current: Option<Current>,
}

impl ArtworkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest arbitration result.
    pub fn observe(&mut self, snapshot: Option<&MediaSnapshot>) -> ArtworkAction {
        let Some(snapshot) = snapshot else {
            return match self.current.take() {
                Some(previous) => {
                    cancel_current(previous);
                    ArtworkAction::Cleared
                }
                None => ArtworkAction::Keep,
            };
        };

        let identity = snapshot.identity();
        if let Some(current) = &mut self.current {
            if current.identity == identity {
                if current.artwork.is_none() {
                    if let Some(own) = &snapshot.artwork_ref {
                        current.artwork = Some(own.clone());
                    }
                }
                return ArtworkAction::Keep;
            }
        }

        if let Some(previous) = self.current.take() {
            tracing::debug!(from = %previous.identity, to = %identity, "media identity changed");
            cancel_current(previous);
        }

        if let Some(own) = &snapshot.artwork_ref {
            self.current = Some(Current {
                identity,
                artwork: Some(own.clone()),
                cancel: None,
            });
            return ArtworkAction::Keep;
        }

        let cancel = CancellationToken::new();
        self.current = Some(Current {
            identity: identity.clone(),
            artwork: None,
            cancel: Some(cancel.clone()),
        });
        ArtworkAction::Fetch { identity, cancel }
    }

    /// Accept a finished fetch. Returns false when the result is stale.
    pub fn complete(&mut self, identity: &MediaIdentity, artwork: Option<String>) -> bool {
        match &mut self.current {
            Some(current) if &current.identity == identity => {
                current.cancel = None;
                if artwork.is_some() {
                    current.artwork = artwork;
                }
                true
            }
            _ => {
                tracing::debug!(identity = %identity, "discarding stale artwork");
                false
            }
        }
    }

    /// Artwork for `identity`, only if it is the current one.
    pub fn artwork_for(&self, identity: &MediaIdentity) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|current| &current.identity == identity)
            .and_then(|current| current.artwork.as_deref())
    }

    pub fn current_identity(&self) -> Option<&MediaIdentity> {
        self.current.as_ref().map(|current| &current.identity)
    }
}

fn cancel_current(current: Current) {
    if let Some(cancel) = current.cancel {
        cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str) -> MediaSnapshot {
        MediaSnapshot::new("Music", title, true)
    }

    #[test]
    fn test_new_identity_requests_fetch() {
        let mut tracker = ArtworkTracker::new();
        let action = tracker.observe(Some(&track("A")));
        assert!(matches!(action, ArtworkAction::Fetch { .. }));

        // Same identity again: nothing to do.
        assert!(matches!(tracker.observe(Some(&track("A"))), ArtworkAction::Keep));
    }

    #[test]
    fn test_identity_change_cancels_previous_fetch() {
        let mut tracker = ArtworkTracker::new();
        let ArtworkAction::Fetch { identity: a, cancel: cancel_a } = tracker.observe(Some(&track("A")))
        else {
            panic!("expected fetch");
        };

        let ArtworkAction::Fetch { identity: b, .. } = tracker.observe(Some(&track("B"))) else {
            panic!("expected fetch");
        };

        assert!(cancel_a.is_cancelled());
        // A's late result must not attach to B.
        assert!(!tracker.complete(&a, Some("a.png".into())));
        assert!(tracker.artwork_for(&b).is_none());

        assert!(tracker.complete(&b, Some("b.png".into())));
        assert_eq!(tracker.artwork_for(&b), Some("b.png"));
        assert!(tracker.artwork_for(&a).is_none());
    }

    #[test]
    fn test_own_artwork_skips_fetch() {
        let mut tracker = ArtworkTracker::new();
        let snapshot = track("A").with_artwork("file:///a.jpg");
        assert!(matches!(tracker.observe(Some(&snapshot)), ArtworkAction::Keep));
        assert_eq!(tracker.artwork_for(&snapshot.identity()), Some("file:///a.jpg"));
    }

    #[test]
    fn test_media_gone_clears() {
        let mut tracker = ArtworkTracker::new();
        let ArtworkAction::Fetch { cancel, .. } = tracker.observe(Some(&track("A"))) else {
            panic!("expected fetch");
        };
        assert!(matches!(tracker.observe(None), ArtworkAction::Cleared));
        assert!(cancel.is_cancelled());
        assert!(tracker.current_identity().is_none());
        assert!(matches!(tracker.observe(None), ArtworkAction::Keep));
    }

    #[tokio::test]
    async fn test_null_resolver() {
        let resolver = NullArtworkResolver;
        let art = resolver
            .resolve(&track("A"), &CancellationToken::new())
            .await;
        assert!(art.is_none());
    }
}
