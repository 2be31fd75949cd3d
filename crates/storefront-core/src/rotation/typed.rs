// ── Typed-text sub-machine ──
//
// Reveals the phrases of one slide character by character:
// Typing -> Holding -> FadingOut -> next phrase. Wrapping back to the
// first phrase completes a cycle. The machine is time-agnostic: callers
// pass `now` and read back the single pending deadline.

use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::time::Instant;

/// Phase durations for the typed-text effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingParams {
    /// Delay before each additional character.
    pub typing_speed: Duration,
    /// How long a complete phrase stays visible.
    pub hold: Duration,
    /// Fade-out before the text clears.
    pub fade_out: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TypingPhase {
    /// No phrases: nothing shown, nothing scheduled.
    Idle,
    Typing,
    Holding,
    FadingOut,
}

/// What the render layer shows for the typed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedFrame {
    pub text: String,
    pub phrase_index: usize,
    pub phase: TypingPhase,
}

/// Result of driving the machine at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingStep {
    /// Deadline not reached, or nothing scheduled.
    Waiting,
    /// A phase transition or character reveal happened.
    Stepped,
    /// The phrase index wrapped to 0.
    CycleComplete,
}

#[derive(Debug, Clone)]
pub struct TypedText {
    phrases: Vec<String>,
    params: TypingParams,
    phrase_index: usize,
    revealed: usize,
    phase: TypingPhase,
    deadline: Option<Instant>,
    paused: bool,
}

impl TypedText {
    /// Start typing the first phrase at `now`.
    pub fn new(phrases: Vec<String>, params: TypingParams, now: Instant) -> Self {
        let mut machine = Self {
            phrases,
            params,
            phrase_index: 0,
            revealed: 0,
            phase: TypingPhase::Idle,
            deadline: None,
            paused: false,
        };
        machine.restart(now);
        machine
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn phase(&self) -> TypingPhase {
        self.phase
    }

    /// The single pending phase deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Currently visible text.
    pub fn text(&self) -> String {
        match self.phase {
            TypingPhase::Idle => String::new(),
            _ => self
                .phrases
                .get(self.phrase_index)
                .map(|p| p.chars().take(self.revealed).collect())
                .unwrap_or_default(),
        }
    }

    pub fn frame(&self) -> TypedFrame {
        TypedFrame {
            text: self.text(),
            phrase_index: self.phrase_index,
            phase: self.phase,
        }
    }

    /// Back to an empty first phrase, typing.
    pub fn restart(&mut self, now: Instant) {
        self.phrase_index = 0;
        self.revealed = 0;
        if self.clear_if_empty() {
            return;
        }
        self.phase = TypingPhase::Typing;
        self.schedule(now);
    }

    /// Replace the phrase list. An identical list keeps running; a different
    /// one restarts; an empty one clears immediately.
    pub fn set_phrases(&mut self, phrases: Vec<String>, now: Instant) {
        if phrases == self.phrases {
            return;
        }
        self.phrases = phrases;
        self.restart(now);
    }

    /// New durations apply from the next scheduled phase.
    pub fn set_params(&mut self, params: TypingParams) {
        self.params = params;
    }

    /// Drop the pending deadline, keeping the visible text.
    pub fn pause(&mut self) {
        self.paused = true;
        self.deadline = None;
    }

    /// Re-arm the current phase with its full duration.
    pub fn resume(&mut self, now: Instant) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if !self.clear_if_empty() {
            self.schedule(now);
        }
    }

    /// Perform at most one transition if the deadline has passed.
    pub fn advance(&mut self, now: Instant) -> TypingStep {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return TypingStep::Waiting,
        }
        self.deadline = None;
        if self.clear_if_empty() {
            return TypingStep::Stepped;
        }

        let mut step = TypingStep::Stepped;
        match self.phase {
            TypingPhase::Idle => return TypingStep::Waiting,
            TypingPhase::Typing => {
                self.revealed += 1;
                if self.revealed >= self.current_len() {
                    self.revealed = self.current_len();
                    self.phase = TypingPhase::Holding;
                }
            }
            TypingPhase::Holding => self.phase = TypingPhase::FadingOut,
            TypingPhase::FadingOut => {
                self.revealed = 0;
                self.phrase_index = (self.phrase_index + 1) % self.phrases.len();
                self.phase = TypingPhase::Typing;
                if self.phrase_index == 0 {
                    step = TypingStep::CycleComplete;
                }
            }
        }
        self.schedule(now);
        tracing::trace!(phase = %self.phase, index = self.phrase_index, revealed = self.revealed, "typed text step");
        step
    }

    fn current_len(&self) -> usize {
        self.phrases
            .get(self.phrase_index)
            .map_or(0, |p| p.chars().count())
    }

    fn schedule(&mut self, now: Instant) {
        if self.paused {
            self.deadline = None;
            return;
        }
        let wait = match self.phase {
            TypingPhase::Idle => {
                self.deadline = None;
                return;
            }
            TypingPhase::Typing => self.params.typing_speed,
            TypingPhase::Holding => self.params.hold,
            TypingPhase::FadingOut => self.params.fade_out,
        };
        self.deadline = Some(now + wait);
    }

    /// Clear text and timers when there is nothing to type.
    fn clear_if_empty(&mut self) -> bool {
        if self.phrases.is_empty() {
            self.phase = TypingPhase::Idle;
            self.phrase_index = 0;
            self.revealed = 0;
            self.deadline = None;
            return true;
        }
        if self.phrase_index >= self.phrases.len() {
            self.phrase_index = 0;
            self.revealed = 0;
        }
        false
    }
}
