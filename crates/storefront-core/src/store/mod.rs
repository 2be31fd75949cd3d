// ── Reactive configuration store ──
//
// One slot per managed document. Each slot owns the current
// `EffectiveConfig` snapshot and the document's sync status, both behind
// `watch` channels so any number of consumers can follow changes.

mod config_store;

pub use config_store::{ConfigStore, SyncStatus};
