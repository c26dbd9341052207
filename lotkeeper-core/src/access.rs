use lotkeeper_shared::{Role, User};

use crate::{LotError, LotResult};

/// Actions gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Approve or reject tickets
    ReviewTickets,
    /// Register spots, correct vehicle types, create users
    ManageLot,
}

impl Capability {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            Capability::ReviewTickets => matches!(role, Role::Attendant | Role::Admin),
            Capability::ManageLot => role == Role::Admin,
        }
    }
}

pub fn authorize(user: &User, capability: Capability) -> LotResult<()> {
    if capability.permits(user.role) {
        return Ok(());
    }

    tracing::warn!(user_id = %user.id, role = %user.role, ?capability, "Capability denied");
    Err(LotError::Authorization(format!(
        "role {} may not perform {:?}",
        user.role, capability
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_allowed_for_staff() {
        let attendant = User::new("Ana", "Ruiz", "ana@lot.test", Role::Attendant);
        let admin = User::new("Bo", "Lind", "bo@lot.test", Role::Admin);

        assert!(authorize(&attendant, Capability::ReviewTickets).is_ok());
        assert!(authorize(&admin, Capability::ReviewTickets).is_ok());
    }

    #[test]
    fn test_manage_lot_is_admin_only() {
        let attendant = User::new("Ana", "Ruiz", "ana@lot.test", Role::Attendant);

        let err = authorize(&attendant, Capability::ManageLot).unwrap_err();
        assert!(matches!(err, LotError::Authorization(_)));
    }
}
