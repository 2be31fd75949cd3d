// ── Runtime storefront configuration ──
//
// Describes *what* a Storefront manages: which tenant, which documents,
// and the global rotation parameters. Never touches disk; the CLI builds
// one from its settings file and hands it in.

use crate::defaults::DefaultConfig;
use crate::document::DocumentKind;
use crate::rotation::RotationSettings;

/// Configuration for one storefront instance.
#[derive(Debug, Clone)]
pub struct StorefrontSettings {
    /// Tenant identifier; also the local cache key.
    pub tenant: String,
    /// Documents to load and subscribe to.
    pub documents: Vec<DocumentKind>,
    /// Builtin defaults merged under every override.
    pub defaults: DefaultConfig,
    /// Write defaults upstream when a document does not exist yet.
    pub persist_defaults: bool,
    pub rotation: RotationSettings,
}

impl StorefrontSettings {
    /// All documents, builtin defaults, default rotation.
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            documents: DocumentKind::all(),
            defaults: DefaultConfig::builtin(),
            persist_defaults: true,
            rotation: RotationSettings::default(),
        }
    }

    #[must_use]
    pub fn with_documents(mut self, documents: impl IntoIterator<Item = DocumentKind>) -> Self {
        let mut documents: Vec<_> = documents.into_iter().collect();
        documents.sort();
        documents.dedup();
        self.documents = documents;
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: DefaultConfig) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: RotationSettings) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn persist_defaults(mut self, enabled: bool) -> Self {
        self.persist_defaults = enabled;
        self
    }
}
