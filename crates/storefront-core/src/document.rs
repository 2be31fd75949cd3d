// ── Configuration documents ──
//
// Each kind maps to one remote document key. The set is closed: adding a
// document means adding a variant and its builtin defaults.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// One configuration document managed by the storefront.
#[derive(
    Debug,
    Clone,
    Copy,
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
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DocumentKind {
    /// Colors, typography, and button presets.
    Theme,
    /// Hero slides at the top of the home page.
    Heroes,
    /// Promotional banner strip.
    Banners,
    /// Page sections and the product carousel.
    Layout,
}

impl DocumentKind {
    /// All managed kinds, in load order.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// The remote document key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Theme => "theme",
            Self::Heroes => "heroes",
            Self::Banners => "banners",
            Self::Layout => "layout",
        }
    }
}
