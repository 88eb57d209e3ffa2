//! Host-based tenant resolution.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::context::{ContextKind, TenantContext};
use tessera_core::models::principal::normalize_subdomain;
use tessera_core::repository::TenantRepository;
use tracing::debug;

use crate::config::AccessConfig;

/// Maps an inbound host to a [`TenantContext`].
#[derive(Debug, Clone)]
pub struct TenantResolver {
    config: AccessConfig,
}

impl TenantResolver {
    pub fn new(config: AccessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Resolve a host without touching the store.
    ///
    /// Priority: product-owner host, then internal hosts, then
    /// `{label}.{root}` for a single non-reserved label. Anything else is a
    /// client context without a subdomain.
    pub fn resolve(&self, host: &str) -> TenantContext {
        let host = normalize_host(host);
        let root = normalize_host(&self.config.root_domain);

        if host == self.config.product_owner_host().to_ascii_lowercase() {
            return TenantContext::product_owner();
        }
        if host == root || host == self.config.internal_host().to_ascii_lowercase() {
            return TenantContext::internal();
        }

        let label = host
            .strip_suffix(root.as_str())
            .and_then(|rest| rest.strip_suffix('.'));
        match label {
            Some(label) if is_dns_label(label) && !self.config.is_reserved_label(label) => {
                TenantContext::client(label)
            }
            _ => TenantContext::unresolved(),
        }
    }

    /// Resolve a host, falling back to an explicit subdomain parameter.
    ///
    /// The parameter is only consulted when the host is not the
    /// product-owner host and carries no tenant label of its own. It must
    /// name an existing tenant; otherwise the result is unresolved.
    pub async fn resolve_with_fallback<T: TenantRepository>(
        &self,
        host: &str,
        explicit_subdomain: Option<&str>,
        tenants: &T,
    ) -> TesseraResult<TenantContext> {
        let resolved = self.resolve(host);
        if resolved.kind == ContextKind::ProductOwner || resolved.subdomain.is_some() {
            return Ok(resolved);
        }

        let Some(param) = explicit_subdomain.filter(|_| self.config.allow_subdomain_param) else {
            return Ok(resolved);
        };

        let label = normalize_subdomain(param);
        if !is_dns_label(&label) || self.config.is_reserved_label(&label) {
            debug!(subdomain = %label, "Rejected subdomain parameter");
            return Ok(TenantContext::unresolved());
        }

        match tenants.get_by_subdomain(&label).await {
            Ok(tenant) => Ok(TenantContext::client(tenant.subdomain)),
            Err(TesseraError::NotFound { .. }) => {
                debug!(subdomain = %label, "Subdomain parameter names no tenant");
                Ok(TenantContext::unresolved())
            }
            Err(e) => Err(e),
        }
    }
}

/// Lower-case, trim, and drop a trailing dot and numeric port.
fn normalize_host(raw: &str) -> String {
    let host = raw.trim().to_ascii_lowercase();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            name.to_string()
        }
        _ => host,
    };
    host.trim_end_matches('.').to_string()
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
