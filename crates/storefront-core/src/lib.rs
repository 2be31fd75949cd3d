// storefront-core: configuration reconciliation and slide rotation for the storefront.

pub mod cache;
pub mod config;
pub mod defaults;
pub mod document;
pub mod effective;
pub mod error;
pub mod merge;
pub mod model;
pub mod rotation;
pub mod store;
pub mod storefront;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{ConfigCache, FileCache, MemoryCache, NoCache};
pub use config::StorefrontSettings;
pub use defaults::DefaultConfig;
pub use document::DocumentKind;
pub use effective::{ConfigOrigin, EffectiveConfig};
pub use error::CoreError;
pub use merge::{MergeOutcome, merge, merge_layers, merge_report};
pub use storefront::Storefront;
pub use store::{ConfigStore, SyncStatus};
pub use stream::{ConfigStream, ConfigWatchStream};

pub use model::{
    AnimationKind, Breakpoint, CallToAction, ResolvedTiming, Slide, SlideDeck, SlideTiming,
    TypedTarget, TypedTextConfig,
};
pub use rotation::{
    AdvanceCause, DeckSource, RotationCommand, RotationController, RotationHandle, RotationMode,
    RotationSettings, RotationState, TypedFrame, TypedText, TypingParams, TypingPhase, TypingStep,
};

// The accessor layer, so downstream crates need only one dependency.
pub use storefront_api::{DocumentBackend, MemoryBackend, RestBackend, TransportConfig};
