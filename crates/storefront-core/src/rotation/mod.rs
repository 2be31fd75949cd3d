// ── Slide rotation ──
//
// `TypedText` and `RotationController` are plain state machines driven by
// explicit `Instant`s; `RotationHandle` runs them on a tokio task.

mod controller;
mod driver;
mod typed;

pub use controller::{AdvanceCause, RotationController, RotationMode, RotationSettings, RotationState};
pub use driver::{DeckSource, RotationCommand, RotationHandle};
pub use typed::{TypedFrame, TypedText, TypingParams, TypingPhase, TypingStep};
