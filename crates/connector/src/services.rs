//! The service registry: composition root for transport and storage slots.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{ConnectorError, ServiceKind};
use crate::storage::{MemoryStorage, StorageAdapter};
use crate::transport::TransportAdapter;
use crate::values::ConfigRecord;

/// Config key holding the base URL requests are resolved against.
pub const BASE_URL_KEY: &str = "baseURL";

/// Holds the three service slots and hands them out on demand.
///
/// Reading an unset slot fails with [`ConnectorError::ServiceUndefined`]
/// instead of returning a default, so a missing transport is never mistaken
/// for "no request needed". The config slot is the exception at
/// construction: it starts with a [`MemoryStorage`] seeded from the initial
/// [`ConfigRecord`].
///
/// `ServiceCore` performs no I/O of its own.
pub struct ServiceCore {
    transport: Option<Arc<dyn TransportAdapter>>,
    session: Option<Arc<dyn StorageAdapter>>,
    config: Option<Arc<dyn StorageAdapter>>,
}

impl ServiceCore {
    /// Creates a core whose config storage holds every key of `initial`.
    pub fn new(initial: ConfigRecord) -> Self {
        let config = MemoryStorage::new();
        for (key, value) in initial {
            if !config.set_item(&key, Some(value)) {
                debug!(key = %key, "initial config entry rejected by storage");
            }
        }
        Self {
            transport: None,
            session: None,
            config: Some(Arc::new(config)),
        }
    }

    // -----------------------------------------------------------------------
    // Transport slot
    // -----------------------------------------------------------------------

    pub fn set_transport_service(&mut self, transport: Arc<dyn TransportAdapter>) -> &mut Self {
        debug!(transport = transport.name(), "transport service installed");
        self.transport = Some(transport);
        self
    }

    pub fn transport_service(&self) -> Result<Arc<dyn TransportAdapter>, ConnectorError> {
        Self::slot(&self.transport, ServiceKind::Transport)
    }

    // -----------------------------------------------------------------------
    // Session slot
    // -----------------------------------------------------------------------

    pub fn set_session_service(&mut self, session: Arc<dyn StorageAdapter>) -> &mut Self {
        self.session = Some(session);
        self
    }

    pub fn session_service(&self) -> Result<Arc<dyn StorageAdapter>, ConnectorError> {
        Self::slot(&self.session, ServiceKind::Session)
    }

    // -----------------------------------------------------------------------
    // Config slot
    // -----------------------------------------------------------------------

    pub fn set_config_service(&mut self, config: Arc<dyn StorageAdapter>) -> &mut Self {
        self.config = Some(config);
        self
    }

    pub fn config_service(&self) -> Result<Arc<dyn StorageAdapter>, ConnectorError> {
        Self::slot(&self.config, ServiceKind::Config)
    }

    /// Reads the base URL from the config service.
    ///
    /// `Ok(None)` when the key is missing or not a string.
    pub fn base_url(&self) -> Result<Option<String>, ConnectorError> {
        let config = self.config_service()?;
        Ok(config
            .get_item(BASE_URL_KEY)
            .and_then(|v| v.as_str().map(str::to_owned)))
    }

    fn slot<T: ?Sized>(
        slot: &Option<Arc<T>>,
        kind: ServiceKind,
    ) -> Result<Arc<T>, ConnectorError> {
        slot.clone().ok_or(ConnectorError::ServiceUndefined(kind))
    }
}

impl Default for ServiceCore {
    fn default() -> Self {
        Self::new(ConfigRecord::new())
    }
}

impl fmt::Debug for ServiceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCore")
            .field("transport", &self.transport.as_ref().map(|t| t.name()))
            .field("session", &self.session.is_some())
            .field("config", &self.config.is_some())
            .finish()
    }
}
