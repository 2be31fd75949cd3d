// ── Rotation state machine ──
//
// Owns the active/previous index over the enabled slides of a deck and at
// most one outer deadline. Slides with typed phrases advance on the typed
// machine's cycle completion instead of a wall-clock interval.

use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::time::Instant;

use super::typed::{TypedFrame, TypedText, TypingParams, TypingStep};
use crate::model::{AnimationKind, Breakpoint, ResolvedTiming, Slide, SlideDeck, SlideTiming};

/// Global rotation parameters; per-deck and per-slide timing override them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSettings {
    /// Fallback timing for anything the deck leaves unset.
    pub timing: ResolvedTiming,
    /// Minimum horizontal swipe distance that counts as a manual advance.
    pub swipe_threshold: f64,
    pub breakpoint: Breakpoint,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            timing: ResolvedTiming::default(),
            swipe_threshold: 50.0,
            breakpoint: Breakpoint::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RotationMode {
    /// At most one enabled slide; no outer timer.
    Idle,
    /// Advancing on the rotation interval.
    AutoAdvancing,
    /// Advancing when the typed text completes a cycle.
    TypingDriven,
    /// An overlay covers the surface; rotation keeps running underneath.
    Suspended,
    /// Explicitly paused; no deadlines pending.
    Paused,
}

/// Snapshot published to the render layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationState {
    pub active_index: Option<usize>,
    pub previous_index: Option<usize>,
    pub mode: RotationMode,
    pub slide_id: Option<String>,
    pub slide_count: usize,
    pub typing_cycle_active: bool,
    pub typed: Option<TypedFrame>,
    pub animation: Option<AnimationKind>,
    /// Total index advancements since creation.
    pub advances: u64,
}

/// Why the active index moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AdvanceCause {
    Interval,
    TypingCycle,
    Manual,
}

#[derive(Debug)]
pub struct RotationController {
    settings: RotationSettings,
    deck_timing: SlideTiming,
    slides: Vec<Slide>,
    active: Option<usize>,
    previous: Option<usize>,
    typed: Option<TypedText>,
    deadline: Option<Instant>,
    /// Interval the pending deadline was armed with.
    armed_interval: Duration,
    overlay: bool,
    paused: bool,
    advances: u64,
}

impl RotationController {
    pub fn new(settings: RotationSettings) -> Self {
        Self {
            settings,
            deck_timing: SlideTiming::default(),
            slides: Vec::new(),
            active: None,
            previous: None,
            typed: None,
            deadline: None,
            armed_interval: Duration::ZERO,
            overlay: false,
            paused: false,
            advances: 0,
        }
    }

    /// Controller already loaded with `deck`.
    pub fn with_deck(settings: RotationSettings, deck: &SlideDeck, now: Instant) -> Self {
        let mut controller = Self::new(settings);
        controller.set_deck(deck, now);
        controller
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn active_slide(&self) -> Option<&Slide> {
        self.active.and_then(|i| self.slides.get(i))
    }

    pub fn mode(&self) -> RotationMode {
        if self.paused {
            RotationMode::Paused
        } else if self.overlay {
            RotationMode::Suspended
        } else if self.slides.len() <= 1 {
            RotationMode::Idle
        } else if self.typed.is_some() {
            RotationMode::TypingDriven
        } else {
            RotationMode::AutoAdvancing
        }
    }

    /// Earliest pending deadline across the outer and typed machines.
    pub fn next_deadline(&self) -> Option<Instant> {
        let typed = self.typed.as_ref().and_then(TypedText::deadline);
        match (self.deadline, typed) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Load a new deck. A changed slide identity (count or ids of enabled
    /// slides) resets to the first slide; otherwise the running timers are
    /// kept and only the slide data is refreshed.
    pub fn set_deck(&mut self, deck: &SlideDeck, now: Instant) {
        let slides = deck.enabled_slides();
        self.deck_timing = deck.timing;

        let same_identity = slides.len() == self.slides.len()
            && slides.iter().zip(&self.slides).all(|(a, b)| a.id == b.id);
        self.slides = slides;

        if same_identity {
            self.resync_active(now);
            return;
        }

        tracing::debug!(count = self.slides.len(), "slide sequence changed, resetting rotation");
        self.active = if self.slides.is_empty() { None } else { Some(0) };
        self.previous = None;
        self.arm_active(now);
    }

    pub fn set_breakpoint(&mut self, breakpoint: Breakpoint) {
        if self.settings.breakpoint == breakpoint {
            return;
        }
        self.settings.breakpoint = breakpoint;
        if let Some(timing) = self.active_timing() {
            if let Some(typed) = self.typed.as_mut() {
                typed.set_params(typing_params(&timing));
            }
        }
    }

    /// Handle an elapsed deadline. Performs at most one index advancement
    /// no matter how many deadlines have passed.
    pub fn on_timer(&mut self, now: Instant) -> Option<AdvanceCause> {
        if self.paused {
            return None;
        }

        if self.deadline.is_some_and(|d| now >= d) {
            self.deadline = None;
            return self.advance(now, AdvanceCause::Interval);
        }

        let step = self
            .typed
            .as_mut()
            .map_or(TypingStep::Waiting, |typed| typed.advance(now));
        if step == TypingStep::CycleComplete {
            return self.advance(now, AdvanceCause::TypingCycle);
        }
        None
    }

    /// Manual advance (next button, close action).
    pub fn next(&mut self, now: Instant) -> Option<AdvanceCause> {
        self.advance(now, AdvanceCause::Manual)
    }

    /// Swipe gesture; advances when `|distance|` reaches the threshold.
    pub fn swipe(&mut self, distance: f64, now: Instant) -> Option<AdvanceCause> {
        if distance.abs() >= self.settings.swipe_threshold {
            self.next(now)
        } else {
            None
        }
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.deadline = None;
        if let Some(typed) = self.typed.as_mut() {
            typed.pause();
        }
        tracing::debug!("rotation paused");
    }

    /// Re-arm a full interval (or the current typing phase).
    pub fn resume(&mut self, now: Instant) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(typed) = self.typed.as_mut() {
            typed.resume(now);
        } else {
            self.arm_interval(now);
        }
        tracing::debug!("rotation resumed");
    }

    /// Overlays only change the reported mode; timers keep running.
    pub fn set_overlay(&mut self, open: bool) {
        self.overlay = open;
    }

    pub fn state(&self) -> RotationState {
        let timing = self.active_timing();
        RotationState {
            active_index: self.active,
            previous_index: self.previous,
            mode: self.mode(),
            slide_id: self.active_slide().map(|s| s.id.clone()),
            slide_count: self.slides.len(),
            typing_cycle_active: self.typed.is_some(),
            typed: self.typed.as_ref().map(TypedText::frame),
            animation: timing.map(|t| t.animation),
            advances: self.advances,
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn advance(&mut self, now: Instant, cause: AdvanceCause) -> Option<AdvanceCause> {
        let count = self.slides.len();
        let current = self.active?;
        if count <= 1 {
            return None;
        }
        self.previous = Some(current);
        self.active = Some((current + 1) % count);
        self.advances += 1;
        self.arm_active(now);
        tracing::debug!(%cause, from = current, to = ?self.active, "rotation advanced");
        Some(cause)
    }

    /// Replace every deadline with fresh tracking for the active slide.
    fn arm_active(&mut self, now: Instant) {
        self.deadline = None;
        self.typed = None;

        let Some(slide) = self.active_slide() else {
            return;
        };
        let phrases = slide.phrases().to_vec();
        let Some(timing) = self.active_timing() else {
            return;
        };

        if phrases.is_empty() {
            self.arm_interval(now);
        } else {
            let mut typed = TypedText::new(phrases, typing_params(&timing), now);
            if self.paused {
                typed.pause();
            }
            self.typed = Some(typed);
        }
    }

    fn arm_interval(&mut self, now: Instant) {
        self.deadline = None;
        if self.paused || self.slides.len() <= 1 || self.typed.is_some() {
            return;
        }
        if let Some(timing) = self.active_timing() {
            self.deadline = Some(now + timing.rotation_interval);
            self.armed_interval = timing.rotation_interval;
        }
    }

    /// Same slides, possibly new content: keep timers unless the active
    /// slide switched between typed and interval-driven. A new rotation
    /// interval moves the pending deadline.
    fn resync_active(&mut self, now: Instant) {
        let Some(slide) = self.active_slide() else {
            return;
        };
        let phrases = slide.phrases().to_vec();
        let Some(timing) = self.active_timing() else {
            return;
        };

        match (self.typed.is_some(), phrases.is_empty()) {
            (true, false) => {
                if let Some(typed) = self.typed.as_mut() {
                    typed.set_params(typing_params(&timing));
                    typed.set_phrases(phrases, now);
                }
            }
            (true, true) => {
                self.typed = None;
                self.arm_interval(now);
            }
            (false, false) => self.arm_active(now),
            (false, true) => match self.deadline {
                None => self.arm_interval(now),
                // A changed interval keeps the time already spent on the slide.
                Some(deadline) if self.armed_interval != timing.rotation_interval => {
                    let started = deadline.checked_sub(self.armed_interval).unwrap_or(now);
                    self.deadline = Some((started + timing.rotation_interval).max(now));
                    self.armed_interval = timing.rotation_interval;
                }
                Some(_) => {}
            },
        }
    }

    fn active_timing(&self) -> Option<ResolvedTiming> {
        let slide = self.active_slide()?;
        let overrides = slide.timing_at(self.settings.breakpoint).or(&self.deck_timing);
        Some(overrides.resolve(&self.settings.timing))
    }
}

fn typing_params(timing: &ResolvedTiming) -> TypingParams {
    TypingParams {
        typing_speed: timing.typing_speed,
        hold: timing.hold,
        fade_out: timing.fade_out,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::rotation::typed::TypingPhase;

    const MS: Duration = Duration::from_millis(1);
    const SEC: Duration = Duration::from_secs(1);

    fn deck(value: serde_json::Value) -> SlideDeck {
        SlideDeck::from_value(&value)
    }

    fn plain_deck(ids: &[&str]) -> SlideDeck {
        let slides: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        deck(json!({"rotation_interval": 1, "slides": slides}))
    }

    fn typed_deck() -> SlideDeck {
        deck(json!({
            "rotation_interval": 1,
            "typing": {"typing_speed": 10, "delay_between_phrases": 10, "fade_out_duration": 10},
            "slides": [
                {"id": "t", "typed": {"target": "title", "phrases": ["a", "b"]}},
                {"id": "p1"},
                {"id": "p2"}
            ]
        }))
    }

    #[test]
    fn empty_deck_is_idle_without_index() {
        let c = RotationController::with_deck(RotationSettings::default(), &SlideDeck::default(), Instant::now());
        let state = c.state();
        assert_eq!(state.mode, RotationMode::Idle);
        assert_eq!(state.active_index, None);
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn disabled_slides_are_never_visited() {
        let t0 = Instant::now();
        let d = deck(json!({
            "rotation_interval": 1,
            "slides": [{"id": "a"}, {"id": "off", "enabled": false}, {"id": "b"}]
        }));
        let mut c = RotationController::with_deck(RotationSettings::default(), &d, t0);
        c.on_timer(t0 + SEC);
        assert_eq!(c.state().slide_id.as_deref(), Some("b"));
        c.on_timer(t0 + 2 * SEC);
        assert_eq!(c.state().slide_id.as_deref(), Some("a"));
    }

    #[test]
    fn interval_advance_single_steps() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b", "c"]), t0);
        assert_eq!(c.mode(), RotationMode::AutoAdvancing);
        assert_eq!(c.next_deadline(), Some(t0 + SEC));

        assert_eq!(c.on_timer(t0 + 500 * MS), None);
        // A late wake-up still moves exactly one slide.
        assert_eq!(c.on_timer(t0 + 5 * SEC), Some(AdvanceCause::Interval));
        let state = c.state();
        assert_eq!(state.active_index, Some(1));
        assert_eq!(state.previous_index, Some(0));
        assert_eq!(c.next_deadline(), Some(t0 + 6 * SEC));
    }

    #[test]
    fn shrinking_to_one_slide_goes_idle() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b", "c"]), t0);
        c.on_timer(t0 + SEC);
        c.set_deck(&plain_deck(&["a"]), t0 + SEC + MS);

        let state = c.state();
        assert_eq!(state.mode, RotationMode::Idle);
        assert_eq!(state.active_index, Some(0));
        assert_eq!(state.previous_index, None);
        assert!(c.next_deadline().is_none());
        assert_eq!(c.on_timer(t0 + 10 * SEC), None);
    }

    #[test]
    fn identity_change_resets_to_first() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b", "c"]), t0);
        c.on_timer(t0 + SEC);
        c.set_deck(&plain_deck(&["a", "x", "c"]), t0 + SEC);
        assert_eq!(c.state().active_index, Some(0));
        assert_eq!(c.state().previous_index, None);
    }

    #[test]
    fn same_identity_keeps_position_and_deadline() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b"]), t0);
        c.on_timer(t0 + SEC);
        let deadline = c.next_deadline();

        let edited = deck(json!({
            "rotation_interval": 1,
            "slides": [{"id": "a", "title": "new"}, {"id": "b", "title": "copy"}]
        }));
        c.set_deck(&edited, t0 + SEC + 200 * MS);
        assert_eq!(c.state().active_index, Some(1));
        assert_eq!(c.next_deadline(), deadline);
        assert_eq!(c.active_slide().unwrap().title.as_deref(), Some("copy"));
    }

    #[test]
    fn reloaded_interval_moves_pending_deadline() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b"]), t0);
        assert_eq!(c.next_deadline(), Some(t0 + SEC));

        let slower = deck(json!({"rotation_interval": 3, "slides": [{"id": "a"}, {"id": "b"}]}));
        c.set_deck(&slower, t0 + 400 * MS);
        assert_eq!(c.state().active_index, Some(0));
        assert_eq!(c.next_deadline(), Some(t0 + 3 * SEC));
        assert_eq!(c.on_timer(t0 + SEC), None);

        // Shrinking below the elapsed time fires on the next tick.
        let faster = deck(json!({"rotation_interval": 1, "slides": [{"id": "a"}, {"id": "b"}]}));
        c.set_deck(&faster, t0 + 2 * SEC);
        assert_eq!(c.next_deadline(), Some(t0 + 2 * SEC));
        assert_eq!(c.on_timer(t0 + 2 * SEC), Some(AdvanceCause::Interval));
        assert_eq!(c.state().active_index, Some(1));
    }

    #[test]
    fn typing_slide_advances_on_cycle_only() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &typed_deck(), t0);
        assert_eq!(c.mode(), RotationMode::TypingDriven);

        let mut advanced = Vec::new();
        while let Some(deadline) = c.next_deadline() {
            if deadline > t0 + 60 * MS {
                break;
            }
            if let Some(cause) = c.on_timer(deadline) {
                advanced.push((deadline, cause));
            }
        }
        assert_eq!(advanced, vec![(t0 + 60 * MS, AdvanceCause::TypingCycle)]);
        assert_eq!(c.state().active_index, Some(1));
        assert_eq!(c.mode(), RotationMode::AutoAdvancing);
        assert!(c.state().typed.is_none());
    }

    #[test]
    fn manual_advance_cancels_hold() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &typed_deck(), t0);
        c.on_timer(t0 + 10 * MS);
        assert_eq!(c.state().typed.unwrap().phase, TypingPhase::Holding);

        assert_eq!(c.next(t0 + 15 * MS), Some(AdvanceCause::Manual));
        assert_eq!(c.state().active_index, Some(1));
        // The cancelled hold would have ended at 20ms.
        assert_eq!(c.on_timer(t0 + 20 * MS), None);
        assert_eq!(c.state().active_index, Some(1));
        assert_eq!(c.next_deadline(), Some(t0 + 15 * MS + SEC));
    }

    #[test]
    fn swipe_respects_threshold() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b"]), t0);
        assert_eq!(c.swipe(-20.0, t0), None);
        assert_eq!(c.swipe(-80.0, t0), Some(AdvanceCause::Manual));
        assert_eq!(c.state().active_index, Some(1));
    }

    #[test]
    fn manual_advance_on_single_slide_is_noop() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a"]), t0);
        assert_eq!(c.next(t0), None);
        assert_eq!(c.state().advances, 0);
    }

    #[test]
    fn overlay_suspends_without_stopping() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b"]), t0);
        c.set_overlay(true);
        assert_eq!(c.mode(), RotationMode::Suspended);
        assert_eq!(c.on_timer(t0 + SEC), Some(AdvanceCause::Interval));
        c.set_overlay(false);
        assert_eq!(c.mode(), RotationMode::AutoAdvancing);
    }

    #[test]
    fn pause_clears_deadlines_and_resume_rearms_full_interval() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &plain_deck(&["a", "b"]), t0);
        c.pause();
        assert_eq!(c.mode(), RotationMode::Paused);
        assert!(c.next_deadline().is_none());
        assert_eq!(c.on_timer(t0 + 3 * SEC), None);

        c.resume(t0 + 3 * SEC);
        assert_eq!(c.next_deadline(), Some(t0 + 4 * SEC));
    }

    #[test]
    fn phrases_removed_switch_to_interval() {
        let t0 = Instant::now();
        let mut c = RotationController::with_deck(RotationSettings::default(), &typed_deck(), t0);
        c.on_timer(t0 + 10 * MS);

        let plain = deck(json!({
            "rotation_interval": 1,
            "slides": [{"id": "t"}, {"id": "p1"}, {"id": "p2"}]
        }));
        c.set_deck(&plain, t0 + 12 * MS);
        let state = c.state();
        assert_eq!(state.active_index, Some(0));
        assert!(state.typed.is_none());
        assert_eq!(state.mode, RotationMode::AutoAdvancing);
        assert_eq!(c.next_deadline(), Some(t0 + 12 * MS + SEC));
    }

    #[test]
    fn breakpoint_changes_typing_speed() {
        let t0 = Instant::now();
        let d = deck(json!({
            "rotation_interval": 1,
            "typing": {"typing_speed": 10},
            "slides": [
                {"id": "t", "typed": {"target": "title", "phrases": ["abc"]},
                 "breakpoints": {"mobile": {"typing_speed": 40}}},
                {"id": "p"}
            ]
        }));
        let mut c = RotationController::with_deck(RotationSettings::default(), &d, t0);
        c.set_breakpoint(Breakpoint::Mobile);
        c.on_timer(t0 + 10 * MS);
        assert_eq!(c.next_deadline(), Some(t0 + 50 * MS));
    }
}
