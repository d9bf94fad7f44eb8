//! Host name resolution for the database host check.

use async_trait::async_trait;
use std::io;
use tracing::debug;

/// Resolves a host name to at least one address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> io::Result<()>;
}

/// Uses the system resolver through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<()> {
        let mut addrs = tokio::net::lookup_host((host, 0)).await?;

        match addrs.next() {
            Some(addr) => {
                debug!(host, ip = %addr.ip(), "Resolved host");
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for {}", host),
            )),
        }
    }
}
