//! Access core configuration.

use serde::Deserialize;

/// Host layout the tenant resolver and login-URL computation work against.
///
/// With the defaults, `owner.crm.example` is the product-owner host,
/// `crm.example` and `app.crm.example` are internal hosts, and
/// `<tenant>.crm.example` addresses a client tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Root domain every tenant host hangs off (e.g. `crm.example`).
    pub root_domain: String,
    /// Reserved label of the product-owner host.
    pub product_owner_prefix: String,
    /// Reserved label of the internal-employee host. The bare root domain
    /// is internal as well.
    pub internal_prefix: String,
    /// URL scheme used when building login URLs.
    pub scheme: String,
    /// Honour an explicit subdomain parameter when the host carries no
    /// tenant label (deployments without wildcard DNS).
    pub allow_subdomain_param: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            root_domain: "crm.example".into(),
            product_owner_prefix: "owner".into(),
            internal_prefix: "app".into(),
            scheme: "https".into(),
            allow_subdomain_param: true,
        }
    }
}

impl AccessConfig {
    pub fn product_owner_host(&self) -> String {
        format!("{}.{}", self.product_owner_prefix, self.root_domain)
    }

    pub fn internal_host(&self) -> String {
        format!("{}.{}", self.internal_prefix, self.root_domain)
    }

    pub fn tenant_host(&self, subdomain: &str) -> String {
        format!("{subdomain}.{}", self.root_domain)
    }

    /// Labels that can never name a tenant.
    pub fn is_reserved_label(&self, label: &str) -> bool {
        label.eq_ignore_ascii_case(&self.product_owner_prefix)
            || label.eq_ignore_ascii_case(&self.internal_prefix)
    }

    pub fn login_url(&self, host: &str) -> String {
        format!("{}://{host}/login", self.scheme)
    }
}
