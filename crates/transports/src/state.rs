//! State shared by every transport adapter: base URL, default headers, and
//! the installed-or-default native client.

use std::sync::{PoisonError, RwLock};

use connector::{prepare_request, CallOptions, DrupalError, DrupalResult, Headers, PreparedRequest};

pub(crate) struct AdapterState<C> {
    base_url: Option<String>,
    headers: RwLock<Headers>,
    installed: RwLock<Option<C>>,
    default_client: C,
}

impl<C: Clone> AdapterState<C> {
    pub(crate) fn new(default_client: C) -> Self {
        Self {
            base_url: None,
            headers: RwLock::new(Headers::new()),
            installed: RwLock::new(None),
            default_client,
        }
    }

    pub(crate) fn set_base_url(&mut self, base_url: String) {
        self.base_url = Some(base_url);
    }

    pub(crate) fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub(crate) fn merge_headers(&self, headers: Headers) {
        let mut current = self.headers.write().unwrap_or_else(PoisonError::into_inner);
        for (name, value) in headers {
            current.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            current.insert(name, value);
        }
    }

    pub(crate) fn headers(&self) -> Headers {
        self.headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_client(&self, client: Option<C>) {
        *self.installed.write().unwrap_or_else(PoisonError::into_inner) = client;
    }

    pub(crate) fn client(&self) -> C {
        self.installed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.default_client.clone())
    }

    pub(crate) fn is_default_client(&self) -> bool {
        self.installed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Resolves a logical call, attributing malformed requests to `transport`.
    pub(crate) fn prepare(
        &self,
        transport: &str,
        method: &str,
        path: &str,
        options: &CallOptions,
    ) -> DrupalResult<PreparedRequest> {
        let headers = self.headers();
        prepare_request(self.base_url(), &headers, method, path, options)
            .map_err(|e| DrupalError::transport_failure(transport, e))
    }
}
