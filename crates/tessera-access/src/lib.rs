//! Tessera Access: tenant resolution, context admission, project access
//! control, resource sharing and the internal-only visibility gate.

pub mod activation;
pub mod admission;
mod audit;
pub mod config;
pub mod error;
pub mod project_access;
pub mod resource_share;
pub mod roles;
pub mod scope;
pub mod tenant;
pub mod visibility;

pub use activation::OwnerActivation;
pub use admission::{AdmissionService, allowed_login_url, verify_principal_allowed};
pub use config::AccessConfig;
pub use error::AccessError;
pub use project_access::ProjectAccessLedger;
pub use resource_share::{BulkShareOutcome, ResourceShareLedger, ShareRequest};
pub use roles::{RoleClass, classify};
pub use scope::ProjectScope;
pub use tenant::TenantResolver;
pub use visibility::{VisibilityService, filter_visible};
