//! Asynchronous DNS (§4.B), adapted from the upstream resolver-subprocess
//! model to `hickory-resolver`'s async tokio resolver — recorded as a
//! deliberate adaptation in `SPEC_FULL.md`'s resolved open questions, not a
//! silent behaviour change: forward/reverse lookups still present as a
//! single owned future per request, and dropping that future is the
//! cancellation path `dns_delall` maps to.

use std::net::IpAddr;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::error::ProxyError;

#[derive(Clone)]
pub struct Resolver {
    inner: TokioAsyncResolver,
}

impl Resolver {
    pub fn from_system_config() -> Result<Self, ProxyError> {
        let inner = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Ok(Self { inner })
    }

    /// `addrfromhost`: forward lookup, first address returned.
    pub async fn addr_from_host(&self, host: &str) -> Result<IpAddr, ProxyError> {
        self.inner
            .lookup_ip(host)
            .await
            .map_err(|e| ProxyError::Dns {
                host: host.to_string(),
                source: e.into(),
            })?
            .iter()
            .next()
            .ok_or_else(|| ProxyError::Dns {
                host: host.to_string(),
                source: anyhow::anyhow!("no addresses returned"),
            })
    }

    /// `hostfromaddr`: reverse lookup, first name returned (without trailing dot).
    pub async fn host_from_addr(&self, addr: IpAddr) -> Result<String, ProxyError> {
        let response = self.inner.reverse_lookup(addr).await.map_err(|e| ProxyError::Dns {
            host: addr.to_string(),
            source: e.into(),
        })?;
        response
            .iter()
            .next()
            .map(|name| name.to_string().trim_end_matches('.').to_string())
            .ok_or_else(|| ProxyError::Dns {
                host: addr.to_string(),
                source: anyhow::anyhow!("no PTR record"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_constructs_from_system_config() {
        assert!(Resolver::from_system_config().is_ok());
    }
}
