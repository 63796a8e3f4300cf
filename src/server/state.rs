//! Shared application state injected into every Axum handler.

use crate::config::{ConversionConfig, ServerConfig};
use crate::error::ConvertError;
use crate::store::OutputStore;
use std::sync::Arc;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Bind address, drop-box location, public URL, limits.
    pub server: Arc<ServerConfig>,
    /// Settings handed to every conversion.
    pub conversion: Arc<ConversionConfig>,
    /// The drop box for link-mode results.
    pub store: OutputStore,
}

impl AppState {
    /// Build the state, creating the output directory if needed.
    pub async fn new(
        server: ServerConfig,
        conversion: ConversionConfig,
    ) -> Result<Arc<Self>, ConvertError> {
        let store = OutputStore::open(server.output_dir.clone()).await?;
        Ok(Arc::new(Self {
            server: Arc::new(server),
            conversion: Arc::new(conversion),
            store,
        }))
    }
}
