//! Role classification.
//!
//! Every capability is derived on demand from the stored principal record.
//! Nothing here is cached, so a corrected attribute takes effect on the
//! very next check.

use tessera_core::error::TesseraResult;
use tessera_core::models::principal::{Principal, PrincipalRole};

use crate::error::AccessError;

/// Rank of an internal employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalRank {
    SuperAdmin,
    Admin,
    Staff,
}

/// The single partition a well-formed principal falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    /// The tenant-less super principal operating the platform.
    ProductOwner,
    /// Super admin of one client tenant.
    CompanySuperAdmin,
    InternalEmployee(InternalRank),
    /// Any other member of a client tenant.
    ClientMember,
}

/// `super_admin`, not an employee, no tenant.
pub fn is_product_owner(p: &Principal) -> bool {
    p.role == PrincipalRole::SuperAdmin
        && !p.is_internal_employee
        && p.normalized_subdomain().is_none()
}

/// `super_admin` of a client tenant.
pub fn is_company_super_admin(p: &Principal) -> bool {
    p.role == PrincipalRole::SuperAdmin
        && !p.is_internal_employee
        && p.normalized_subdomain().is_some()
}

pub fn is_internal_super_admin(p: &Principal) -> bool {
    p.is_internal_employee && p.role == PrincipalRole::SuperAdmin
}

pub fn is_internal_admin(p: &Principal) -> bool {
    p.is_internal_employee && p.role == PrincipalRole::Admin
}

pub fn can_manage_internal_employees(p: &Principal) -> bool {
    is_product_owner(p) || is_internal_super_admin(p) || is_internal_admin(p)
}

/// Place a principal in exactly one [`RoleClass`].
///
/// Records where the role, employee flag and tenant disagree (an employee
/// that carries a tenant, or a tenant-less non-super-admin outsider) are
/// rejected as malformed rather than guessed at.
pub fn classify(p: &Principal) -> TesseraResult<RoleClass> {
    let has_tenant = p.normalized_subdomain().is_some();

    let class = match (p.is_internal_employee, has_tenant, p.role) {
        (true, true, _) => {
            return Err(AccessError::MalformedPrincipal("internal employee with a tenant").into());
        }
        (true, false, PrincipalRole::SuperAdmin) => {
            RoleClass::InternalEmployee(InternalRank::SuperAdmin)
        }
        (true, false, PrincipalRole::Admin) => RoleClass::InternalEmployee(InternalRank::Admin),
        (true, false, PrincipalRole::User) => RoleClass::InternalEmployee(InternalRank::Staff),
        (false, false, PrincipalRole::SuperAdmin) => RoleClass::ProductOwner,
        (false, false, _) => {
            return Err(AccessError::MalformedPrincipal("outside principal without a tenant").into());
        }
        (false, true, PrincipalRole::SuperAdmin) => RoleClass::CompanySuperAdmin,
        (false, true, _) => RoleClass::ClientMember,
    };

    Ok(class)
}
