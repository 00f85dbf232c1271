//! Shared HTTP client with an explicit "close everything" operation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;

use crate::error::Result;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Pooled HTTP client.
///
/// Cloning the pool shares the same underlying client. `close_all` swaps in a
/// freshly built client so every idle keep-alive connection of the old one is
/// dropped once in-flight requests finish.
#[derive(Debug, Clone)]
pub struct HttpPool {
    client: Arc<Mutex<Client>>,
    timeout: Duration,
    generation: Arc<AtomicU64>,
}

impl HttpPool {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Arc::new(Mutex::new(Self::build(timeout)?)),
            timeout,
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    fn build(timeout: Duration) -> Result<Client> {
        Ok(Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?)
    }

    /// Handle to the current pooled client.
    pub fn client(&self) -> Client {
        self.client.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Client that keeps no idle connections; used for fire-and-forget pushes.
    pub fn oneshot(&self) -> Result<Client> {
        Ok(Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(0)
            .build()?)
    }

    /// Drop every pooled connection.
    pub fn close_all(&self) -> Result<()> {
        let fresh = Self::build(self.timeout)?;
        *self.client.lock().unwrap_or_else(|e| e.into_inner()) = fresh;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("HTTP pool reset (generation {})", generation);
        Ok(())
    }

    /// Number of times the pool has been reset.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
