//! Now-playing source arbitration.
//!
//! Several providers may each report media. [`SourceArbiter`] consults them
//! in priority order under per-provider timeouts and picks one snapshot:
//!
//! 1. The first provider that is actively playing wins; later providers are
//!    not consulted.
//! 2. Otherwise the first paused result by priority is remembered.
//! 3. The fallback provider is consulted once. If it is playing it wins,
//!    otherwise the remembered paused result, then the fallback's own paused
//!    result, then nothing.
//!
//! Failures and timeouts are skipped, never fatal.
//!
//! [`ArtworkTracker`] keys secondary artwork fetches to the snapshot identity
//! so results for an old track are dropped.

mod arbiter;
mod artwork;
mod command;
mod error;
mod provider;
mod snapshot;

pub use arbiter::{
    reduce, ArbitrationStrategy, Reduction, SourceArbiter, DEFAULT_FALLBACK_TIMEOUT,
};
pub use artwork::{
    ArtworkAction, ArtworkResolver, ArtworkResolverRef, ArtworkTracker, NullArtworkResolver,
};
pub use command::{parse_line, CommandProvider, CommandSpec};
pub use error::ProviderError;
pub use provider::{MediaProvider, MediaProviderRef, ProviderSlot, DEFAULT_PROVIDER_TIMEOUT};
pub use snapshot::{MediaIdentity, MediaSnapshot, ProviderResult};
