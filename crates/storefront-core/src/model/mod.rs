// ── Domain model ──
//
// Typed views over the JSON configuration documents. Parsing is lenient:
// the merged configuration is already complete, so anything still
// malformed is skipped rather than rejected.

mod slide;

pub use slide::{
    AnimationKind, Breakpoint, CallToAction, ResolvedTiming, Slide, SlideDeck, SlideTiming,
    TypedTarget, TypedTextConfig,
};
