//! Process-scoped encoder lifecycle.
//!
//! The handle is constructed once at startup and shared (`Arc`) with every
//! request. The model is loaded on first use or by an explicit
//! [`EncoderHandle::warm_up`]; the outcome of that single load, success or
//! failure, is kept for the life of the handle. Dropping the last `Arc`
//! releases the model.

use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use nomad_core::error::{Error, Result};
use nomad_core::traits::TextEncoder;

type Loader = Box<dyn Fn() -> anyhow::Result<Arc<dyn TextEncoder>> + Send + Sync>;

pub struct EncoderHandle {
    loader: Loader,
    cell: OnceLock<std::result::Result<Arc<dyn TextEncoder>, String>>,
}

impl EncoderHandle {
    pub fn lazy<F>(loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn TextEncoder>> + Send + Sync + 'static,
    {
        Self { loader: Box::new(loader), cell: OnceLock::new() }
    }

    /// A handle around an encoder that is already loaded.
    pub fn ready(encoder: Arc<dyn TextEncoder>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(encoder));
        Self { loader: Box::new(|| Err(anyhow::anyhow!("encoder already initialised"))), cell }
    }

    /// A handle whose encoder can never be loaded; every call reports
    /// `EncoderUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Err(reason.into()));
        Self { loader: Box::new(|| Err(anyhow::anyhow!("encoder unavailable"))), cell }
    }

    pub fn get(&self) -> Result<Arc<dyn TextEncoder>> {
        let outcome = self.cell.get_or_init(|| match (self.loader)() {
            Ok(encoder) => {
                info!(encoder = encoder.id(), dim = encoder.dim(), "encoder initialised");
                Ok(encoder)
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "encoder failed to load");
                Err(format!("{:#}", e))
            }
        });
        match outcome {
            Ok(encoder) => Ok(Arc::clone(encoder)),
            Err(msg) => Err(Error::EncoderUnavailable(msg.clone())),
        }
    }

    /// Load eagerly, e.g. at process start.
    pub fn warm_up(&self) -> Result<()> { self.get().map(|_| ()) }

    pub fn is_initialised(&self) -> bool { self.cell.get().is_some() }
}
