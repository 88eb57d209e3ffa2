//! Per-request tenant context.
//!
//! The context is always passed by value through every call; nothing in the
//! core stores a "current tenant".

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Internal,
    ProductOwner,
    Client,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantContext {
    pub kind: ContextKind,
    /// Tenant label for client contexts. A client context without a
    /// subdomain is unresolvable and admits nobody.
    pub subdomain: Option<String>,
}

impl TenantContext {
    pub fn internal() -> Self {
        Self {
            kind: ContextKind::Internal,
            subdomain: None,
        }
    }

    pub fn product_owner() -> Self {
        Self {
            kind: ContextKind::ProductOwner,
            subdomain: None,
        }
    }

    pub fn client(subdomain: impl Into<String>) -> Self {
        Self {
            kind: ContextKind::Client,
            subdomain: Some(subdomain.into()),
        }
    }

    pub fn unresolved() -> Self {
        Self {
            kind: ContextKind::Client,
            subdomain: None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.kind == ContextKind::Client && self.subdomain.is_none()
    }
}
