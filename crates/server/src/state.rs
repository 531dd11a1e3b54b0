//! Application state shared across handlers.

use emboss_core::AppConfig;
use emboss_signer::ZsignTool;
use emboss_storage::{ArtifactStore, SessionStore};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Upload session directories.
    pub sessions: Arc<SessionStore>,
    /// Artifact registry over the output directory.
    pub artifacts: Arc<dyn ArtifactStore>,
    /// External signing tool.
    pub signer: Arc<ZsignTool>,
    /// Bounds concurrent signing-tool invocations.
    pub sign_permits: Arc<Semaphore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// This performs configuration validation and logs warnings for
    /// potentially dangerous settings. Panics if configuration is invalid.
    ///
    /// # Panics
    ///
    /// Panics if configuration validation fails with an error.
    pub fn new(
        config: AppConfig,
        sessions: Arc<SessionStore>,
        artifacts: Arc<dyn ArtifactStore>,
        signer: Arc<ZsignTool>,
    ) -> Self {
        match config.validate() {
            Ok(warnings) => {
                for warning in warnings {
                    tracing::warn!("Configuration warning: {}", warning);
                }
            }
            Err(error) => {
                panic!("Invalid configuration: {}", error);
            }
        }

        let sign_permits = Arc::new(Semaphore::new(config.signer.max_concurrent_signs as usize));

        Self {
            config: Arc::new(config),
            sessions,
            artifacts,
            signer,
            sign_permits,
        }
    }
}
