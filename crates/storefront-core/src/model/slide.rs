use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

/// Viewport class a slide's timing can be tuned for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Breakpoint {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

/// Enter/exit transition between slides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnimationKind {
    #[default]
    Fade,
    Slide,
    Zoom,
    None,
}

/// Which text field the typed-text effect replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TypedTarget {
    Title,
    Subtitle,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypedTextConfig {
    pub target: TypedTarget,
    pub phrases: Vec<String>,
}

/// Optional timing overrides. Unset fields fall through to the next layer.
///
/// `rotation_interval` is in seconds, the typing fields in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideTiming {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_between_phrases: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_out_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationKind>,
}

impl SlideTiming {
    /// Fill unset fields from `fallback`.
    #[must_use]
    pub fn or(self, fallback: &SlideTiming) -> SlideTiming {
        SlideTiming {
            rotation_interval: self.rotation_interval.or(fallback.rotation_interval),
            typing_speed: self.typing_speed.or(fallback.typing_speed),
            delay_between_phrases: self.delay_between_phrases.or(fallback.delay_between_phrases),
            fade_out_duration: self.fade_out_duration.or(fallback.fade_out_duration),
            animation: self.animation.or(fallback.animation),
        }
    }

    /// Resolve against fully specified `global` values.
    ///
    /// A zero, negative or non-finite interval is treated as unset.
    pub fn resolve(&self, global: &ResolvedTiming) -> ResolvedTiming {
        let positive_ms = |ms: Option<u64>| ms.filter(|v| *v > 0).map(Duration::from_millis);
        ResolvedTiming {
            rotation_interval: self
                .rotation_interval
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .filter(|d| !d.is_zero())
                .unwrap_or(global.rotation_interval),
            typing_speed: positive_ms(self.typing_speed).unwrap_or(global.typing_speed),
            hold: positive_ms(self.delay_between_phrases).unwrap_or(global.hold),
            fade_out: positive_ms(self.fade_out_duration).unwrap_or(global.fade_out),
            animation: self.animation.unwrap_or(global.animation),
        }
    }
}

/// Fully resolved timing for one slide at one breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTiming {
    pub rotation_interval: Duration,
    pub typing_speed: Duration,
    pub hold: Duration,
    pub fade_out: Duration,
    pub animation: AnimationKind,
}

impl Default for ResolvedTiming {
    fn default() -> Self {
        Self {
            rotation_interval: Duration::from_secs(5),
            typing_speed: Duration::from_millis(80),
            hold: Duration::from_millis(2000),
            fade_out: Duration::from_millis(500),
            animation: AnimationKind::Fade,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub label: String,
    pub href: String,
}

/// One rotating content unit: hero, banner, or carousel item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Identity token used for animation keying and change detection.
    #[serde(default)]
    pub id: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<CallToAction>,
    #[serde(default)]
    pub typed: TypedTextConfig,
    #[serde(default)]
    pub timing: SlideTiming,
    #[serde(default)]
    pub breakpoints: BTreeMap<Breakpoint, SlideTiming>,
}

fn enabled_default() -> bool {
    true
}

impl Slide {
    /// Phrases to type; empty when the effect is off for this slide.
    pub fn phrases(&self) -> &[String] {
        if self.typed.target == TypedTarget::None {
            &[]
        } else {
            &self.typed.phrases
        }
    }

    /// Timing overrides at `breakpoint`, most specific first.
    pub fn timing_at(&self, breakpoint: Breakpoint) -> SlideTiming {
        self.breakpoints
            .get(&breakpoint)
            .copied()
            .unwrap_or_default()
            .or(&self.timing)
    }
}

/// An ordered list of slides plus deck-level timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlideDeck {
    pub timing: SlideTiming,
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    /// Parse `{ rotation_interval?, animation?, typing?, slides: [...] }`.
    ///
    /// Malformed slides are skipped; slides without an id get `slide-{index}`.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let mut timing: SlideTiming = obj
            .get("typing")
            .and_then(|t| SlideTiming::deserialize(t).ok())
            .unwrap_or_default();
        timing.rotation_interval = obj.get("rotation_interval").and_then(Value::as_f64);
        timing.animation = obj
            .get("animation")
            .and_then(|a| AnimationKind::deserialize(a).ok());

        let slides = obj
            .get("slides")
            .and_then(Value::as_array)
            .map(|raw| {
                raw.iter()
                    .enumerate()
                    .filter_map(|(index, item)| match Slide::deserialize(item) {
                        Ok(mut slide) => {
                            if slide.id.is_empty() {
                                slide.id = format!("slide-{index}");
                            }
                            Some(slide)
                        }
                        Err(e) => {
                            tracing::debug!(index, error = %e, "skipping malformed slide");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { timing, slides }
    }

    /// Slides that participate in rotation, in order.
    pub fn enabled_slides(&self) -> Vec<Slide> {
        self.slides.iter().filter(|s| s.enabled).cloned().collect()
    }

    /// Timing for `slide` at `breakpoint`: breakpoint, then slide, then
    /// deck, then `global`.
    pub fn timing_for(
        &self,
        slide: &Slide,
        breakpoint: Breakpoint,
        global: &ResolvedTiming,
    ) -> ResolvedTiming {
        slide.timing_at(breakpoint).or(&self.timing).resolve(global)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::defaults::DefaultConfig;
    use crate::document::DocumentKind;
    use serde_json::json;

    #[test]
    fn parses_builtin_hero_deck() {
        let defaults = DefaultConfig::builtin();
        let deck = SlideDeck::from_value(&defaults.get(DocumentKind::Heroes));
        assert_eq!(deck.slides.len(), 3);
        assert_eq!(deck.timing.rotation_interval, Some(6.0));
        assert_eq!(deck.timing.typing_speed, Some(70));

        let flagship = &deck.slides[0];
        assert_eq!(flagship.id, "hero-flagship");
        assert_eq!(flagship.phrases().len(), 3);
        assert!(deck.slides[1].phrases().is_empty());
    }

    #[test]
    fn skips_malformed_and_assigns_positional_ids() {
        let deck = SlideDeck::from_value(&json!({
            "slides": [
                {"title": "no id"},
                {"id": "bad", "enabled": "yes"},
                42,
                {"id": "named", "enabled": false}
            ]
        }));
        let ids: Vec<_> = deck.slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["slide-0", "named"]);
        assert!(deck.enabled_slides().iter().all(|s| s.id == "slide-0"));
    }

    #[test]
    fn non_object_is_empty_deck() {
        assert_eq!(SlideDeck::from_value(&json!([1, 2])), SlideDeck::default());
        assert!(SlideDeck::from_value(&json!({"slides": "nope"})).slides.is_empty());
    }

    #[test]
    fn phrases_ignored_when_target_is_none() {
        let slide: Slide = serde_json::from_value(json!({
            "id": "x",
            "typed": {"target": "none", "phrases": ["a", "b"]}
        }))
        .unwrap();
        assert!(slide.phrases().is_empty());
    }

    #[test]
    fn timing_precedence() {
        let deck = SlideDeck::from_value(&json!({
            "rotation_interval": 6,
            "typing": {"typing_speed": 70, "delay_between_phrases": 1800},
            "slides": [{
                "id": "a",
                "timing": {"rotation_interval": 3, "typing_speed": 50},
                "breakpoints": {"mobile": {"typing_speed": 90}}
            }]
        }));
        let global = ResolvedTiming::default();
        let slide = &deck.slides[0];

        let mobile = deck.timing_for(slide, Breakpoint::Mobile, &global);
        assert_eq!(mobile.typing_speed, Duration::from_millis(90));
        assert_eq!(mobile.rotation_interval, Duration::from_secs(3));
        assert_eq!(mobile.hold, Duration::from_millis(1800));
        assert_eq!(mobile.fade_out, global.fade_out);

        let desktop = deck.timing_for(slide, Breakpoint::Desktop, &global);
        assert_eq!(desktop.typing_speed, Duration::from_millis(50));
    }

    #[test]
    fn invalid_interval_falls_back_to_global() {
        let timing = SlideTiming {
            rotation_interval: Some(-1.0),
            typing_speed: Some(0),
            ..SlideTiming::default()
        };
        let global = ResolvedTiming::default();
        let resolved = timing.resolve(&global);
        assert_eq!(resolved.rotation_interval, global.rotation_interval);
        assert_eq!(resolved.typing_speed, global.typing_speed);
    }

    #[test]
    fn fractional_interval() {
        let timing = SlideTiming {
            rotation_interval: Some(1.5),
            ..SlideTiming::default()
        };
        assert_eq!(
            timing.resolve(&ResolvedTiming::default()).rotation_interval,
            Duration::from_millis(1500)
        );
    }
}
