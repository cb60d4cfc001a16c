//! Shared application state.

use std::sync::Arc;

use krona_store::{MemoryStore, Store};

use crate::auth::tokens::TokenManager;
use crate::config::{ServiceConfig, StorageBackend};
use crate::email::{LogMailer, Mailer};
use crate::error::ApiError;
use crate::ledger::Ledger;
use crate::verification::VerificationCodes;

/// Shared state handed to every handler.
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,
    /// Storage backend.
    pub store: Arc<dyn Store>,
    /// JWT manager.
    pub tokens: TokenManager,
    /// Ledger engine.
    pub ledger: Ledger,
    /// Verification-code registry.
    pub verification: VerificationCodes,
    /// Outbound email delivery.
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Build the state, opening the configured storage backend.
    pub fn new(config: ServiceConfig) -> Result<Self, ApiError> {
        let store = open_store(&config)?;
        Ok(Self::with_store(config, store, Arc::new(LogMailer)))
    }

    /// Build the state over an already-open store. Used by tests to inject a
    /// memory store and short-lived tokens.
    #[must_use]
    pub fn with_store(
        config: ServiceConfig,
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = TokenManager::new(config.jwt.clone());
        let ledger = Ledger::new(Arc::clone(&store), config.banking.clone());
        let verification = VerificationCodes::new(config.verification.clone());
        Self {
            config,
            store,
            tokens,
            ledger,
            verification,
            mailer,
        }
    }
}

fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, ApiError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage backend");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "rocksdb-backend")]
        StorageBackend::Rocks => {
            tracing::info!(path = %config.data_dir, "Opening RocksDB storage backend");
            let store = krona_store::RocksStore::open(&config.data_dir)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StorageBackend::Rocks => Err(ApiError::Internal(
            "binary was built without the rocksdb-backend feature".into(),
        )),
    }
}
