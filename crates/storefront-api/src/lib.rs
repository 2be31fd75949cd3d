// storefront-api: thin async accessor for the remote configuration document store

pub mod backend;
pub mod error;
pub mod feed;
pub mod memory;
pub mod rest;
pub mod transport;

pub use backend::{DocumentBackend, DocumentSubscription, FeedEvent};
pub use error::Error;
pub use feed::ReconnectConfig;
pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use transport::{TlsMode, TransportConfig};
