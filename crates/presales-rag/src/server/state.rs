//! Application state for the presales server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::context::RagContext;
use crate::error::{Error, Result};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Retrieval context; `None` when initialization failed
    context: Option<Arc<RagContext>>,
}

impl AppState {
    /// State for a fully initialized service
    pub fn new(config: RagConfig, context: RagContext) -> Self {
        Self::with_context(config, Some(Arc::new(context)))
    }

    /// State for a service whose index could not be built; every pipeline
    /// endpoint answers `NotInitialized`
    pub fn uninitialized(config: RagConfig) -> Self {
        Self::with_context(config, None)
    }

    fn with_context(config: RagConfig, context: Option<Arc<RagContext>>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, context }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// The retrieval context, or `NotInitialized`
    pub fn context(&self) -> Result<Arc<RagContext>> {
        self.inner.context.clone().ok_or(Error::NotInitialized)
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        self.inner.context.is_some()
    }
}
