//! A network that can be unplugged mid-test.

use async_trait::async_trait;
use portico_core::cache::ResponseSnapshot;
use portico_core::ports::Network;
use portico_core::request::FetchRequest;
use portico_core::{Error, Result};
use portico_offline::HttpNetwork;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// Real HTTP transport that fails every fetch while offline.
pub struct SwitchableNetwork {
    inner: HttpNetwork,
    offline: AtomicBool,
}

impl SwitchableNetwork {
    pub fn new(origin: Url, upstream: Url) -> Result<Self> {
        Ok(Self {
            inner: HttpNetwork::new(origin, upstream, None)?,
            offline: AtomicBool::new(false),
        })
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for SwitchableNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot> {
        if self.is_offline() {
            return Err(Error::Network(format!(
                "{} {}: network unreachable",
                request.method, request.url
            )));
        }
        self.inner.fetch(request).await
    }
}
