//! Builtin default configuration.
//!
//! Compiled into the binary and never mutated. Every field a renderer reads
//! has a value here, so the merged configuration is always fully populated
//! even when the remote document predates the field.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::document::DocumentKind;

/// Immutable default document per [`DocumentKind`].
#[derive(Debug, Clone)]
pub struct DefaultConfig {
    theme: Arc<Value>,
    heroes: Arc<Value>,
    banners: Arc<Value>,
    layout: Arc<Value>,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DefaultConfig {
    /// The defaults shipped with the storefront.
    pub fn builtin() -> Self {
        Self {
            theme: Arc::new(theme()),
            heroes: Arc::new(heroes()),
            banners: Arc::new(banners()),
            layout: Arc::new(layout()),
        }
    }

    /// The default document for `kind`.
    pub fn get(&self, kind: DocumentKind) -> Arc<Value> {
        Arc::clone(self.slot(kind))
    }

    /// Replace one default document.
    #[must_use]
    pub fn with_document(mut self, kind: DocumentKind, document: Value) -> Self {
        *self.slot_mut(kind) = Arc::new(document);
        self
    }

    fn slot(&self, kind: DocumentKind) -> &Arc<Value> {
        match kind {
            DocumentKind::Theme => &self.theme,
            DocumentKind::Heroes => &self.heroes,
            DocumentKind::Banners => &self.banners,
            DocumentKind::Layout => &self.layout,
        }
    }

    fn slot_mut(&mut self, kind: DocumentKind) -> &mut Arc<Value> {
        match kind {
            DocumentKind::Theme => &mut self.theme,
            DocumentKind::Heroes => &mut self.heroes,
            DocumentKind::Banners => &mut self.banners,
            DocumentKind::Layout => &mut self.layout,
        }
    }
}

// ── Builtin documents ────────────────────────────────────────────────

fn theme() -> Value {
    json!({
        "colors": {
            "brand": "#0f172a",
            "accent": "#f97316",
            "background": "#ffffff",
            "surface": "#f8fafc",
            "text": "#0f172a",
            "muted": "#64748b",
            "sale": "#dc2626"
        },
        "typography": {
            "heading_font": "Inter",
            "body_font": "Inter",
            "base_size": 16,
            "scale": 1.25,
            "heading_weight": 700
        },
        "buttons": {
            "primary": {
                "background": "#f97316",
                "foreground": "#ffffff",
                "radius": 9999,
                "padding": "0.75rem 1.5rem",
                "uppercase": false
            },
            "secondary": {
                "background": "#0f172a",
                "foreground": "#ffffff",
                "radius": 9999,
                "padding": "0.75rem 1.5rem",
                "uppercase": false
            },
            "ghost": {
                "background": "transparent",
                "foreground": "#0f172a",
                "radius": 8,
                "padding": "0.5rem 1rem",
                "uppercase": true
            }
        }
    })
}

fn heroes() -> Value {
    json!({
        "rotation_interval": 6,
        "typing": {
            "typing_speed": 70,
            "delay_between_phrases": 1800,
            "fade_out_duration": 400
        },
        "slides": [
            {
                "id": "hero-flagship",
                "enabled": true,
                "title": "The new flagship is here",
                "subtitle": "Pre-order today with free next-day delivery",
                "image": "/images/hero/flagship.webp",
                "cta": { "label": "Shop now", "href": "/phones/flagship" },
                "typed": {
                    "target": "title",
                    "phrases": ["Pro-grade camera.", "Two-day battery.", "Zero compromises."]
                },
                "timing": { "animation": "fade" },
                "breakpoints": {
                    "mobile": { "typing_speed": 90 }
                }
            },
            {
                "id": "hero-trade-in",
                "enabled": true,
                "title": "Trade in, trade up",
                "subtitle": "Get up to $600 credit for your old phone",
                "image": "/images/hero/trade-in.webp",
                "cta": { "label": "Get an estimate", "href": "/trade-in" },
                "typed": { "target": "none", "phrases": [] },
                "timing": { "rotation_interval": 5, "animation": "slide" },
                "breakpoints": {}
            },
            {
                "id": "hero-refurbished",
                "enabled": true,
                "title": "Certified refurbished",
                "subtitle": "Like new. Fully tested. 12-month warranty.",
                "image": "/images/hero/refurbished.webp",
                "cta": { "label": "Browse deals", "href": "/refurbished" },
                "typed": { "target": "none", "phrases": [] },
                "timing": { "animation": "zoom" },
                "breakpoints": {}
            }
        ]
    })
}

fn banners() -> Value {
    json!({
        "rotation_interval": 5,
        "dismissible": true,
        "swipe_to_close": true,
        "slides": [
            {
                "id": "banner-shipping",
                "enabled": true,
                "title": "Free shipping on orders over $50",
                "subtitle": "",
                "typed": { "target": "none", "phrases": [] }
            },
            {
                "id": "banner-financing",
                "enabled": true,
                "title": "0% financing for 24 months",
                "subtitle": "On selected models",
                "typed": {
                    "target": "subtitle",
                    "phrases": ["On selected models", "Subject to approval"]
                }
            }
        ]
    })
}

fn layout() -> Value {
    json!({
        "sections": ["hero", "banners", "featured", "carousel", "story"],
        "container_width": 1280,
        "carousel": {
            "title": "Trending phones",
            "rotation_interval": 4,
            "items_per_view": { "mobile": 1, "tablet": 2, "desktop": 4 },
            "slides": [
                { "id": "carousel-flagship", "enabled": true, "title": "Flagship Pro", "image": "/images/products/flagship-pro.webp" },
                { "id": "carousel-compact", "enabled": true, "title": "Compact", "image": "/images/products/compact.webp" },
                { "id": "carousel-budget", "enabled": true, "title": "Budget Plus", "image": "/images/products/budget-plus.webp" }
            ]
        },
        "story": {
            "enabled": true,
            "title": "Checkout in three taps",
            "steps": ["Pick your phone", "Choose a plan", "Pay your way"],
            "auto_advance": true
        }
    })
}
