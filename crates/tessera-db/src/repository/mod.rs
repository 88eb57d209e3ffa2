//! SurrealDB repository implementations.

mod audit;
mod principal;
mod project;
mod project_access;
mod resource_share;
mod tenant;
mod work_item;

pub use audit::SurrealAuditSink;
pub use principal::SurrealPrincipalRepository;
pub use project::SurrealProjectRepository;
pub use project_access::SurrealProjectAccessRepository;
pub use resource_share::SurrealResourceShareRepository;
pub use tenant::SurrealTenantRepository;
pub use work_item::SurrealWorkItemRepository;
