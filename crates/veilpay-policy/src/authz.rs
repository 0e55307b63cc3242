// SPDX-License-Identifier: BUSL-1.1
//! # Agent Authorization Registry
//!
//! Process-wide allow-list of identities permitted to act as risk-assessment
//! or proof-verification agents. Owned by a single administrative authority;
//! mutable only by that authority. The administrator is authorized at
//! initialization.

use dashmap::DashSet;
use thiserror::Error;

use veilpay_core::ActorId;

/// Errors from authorization-registry mutations.
#[derive(Error, Debug)]
pub enum AuthzError {
    /// The caller is not the administrative authority.
    #[error("caller {caller} is not the registry administrator")]
    Unauthorized {
        /// The rejected caller identity.
        caller: ActorId,
    },
}

/// Administrator-owned agent allow-list.
#[derive(Debug)]
pub struct AgentRegistry {
    admin: ActorId,
    authorized: DashSet<ActorId>,
}

impl AgentRegistry {
    /// Create a registry owned by `admin`. The administrator is authorized
    /// as an agent from the start.
    pub fn new(admin: ActorId) -> Self {
        let authorized = DashSet::new();
        authorized.insert(admin.clone());
        Self { admin, authorized }
    }

    /// The administrative authority that owns this registry.
    pub fn admin(&self) -> &ActorId {
        &self.admin
    }

    /// Grant or revoke agent authorization. Administrator-only.
    pub fn set_authorization(
        &self,
        caller: &ActorId,
        identity: &ActorId,
        authorized: bool,
    ) -> Result<(), AuthzError> {
        if caller != &self.admin {
            return Err(AuthzError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if authorized {
            self.authorized.insert(identity.clone());
        } else {
            self.authorized.remove(identity);
        }
        Ok(())
    }

    /// Whether an identity may act as an agent.
    pub fn is_authorized(&self, identity: &ActorId) -> bool {
        self.authorized.contains(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(s: &str) -> ActorId {
        ActorId::new(s).unwrap()
    }

    #[test]
    fn admin_authorized_at_init() {
        let admin = actor("0xadmin");
        let registry = AgentRegistry::new(admin.clone());
        assert!(registry.is_authorized(&admin));
    }

    #[test]
    fn admin_grants_and_revokes() {
        let admin = actor("0xadmin");
        let agent = actor("0xagent");
        let registry = AgentRegistry::new(admin.clone());

        assert!(!registry.is_authorized(&agent));
        registry.set_authorization(&admin, &agent, true).unwrap();
        assert!(registry.is_authorized(&agent));
        registry.set_authorization(&admin, &agent, false).unwrap();
        assert!(!registry.is_authorized(&agent));
    }

    #[test]
    fn non_admin_cannot_mutate() {
        let admin = actor("0xadmin");
        let intruder = actor("0xintruder");
        let registry = AgentRegistry::new(admin);

        let result = registry.set_authorization(&intruder, &intruder, true);
        assert!(matches!(result, Err(AuthzError::Unauthorized { .. })));
        assert!(!registry.is_authorized(&intruder));
    }

    #[test]
    fn revoking_unknown_identity_is_a_no_op() {
        let admin = actor("0xadmin");
        let registry = AgentRegistry::new(admin.clone());
        registry
            .set_authorization(&admin, &actor("0xghost"), false)
            .unwrap();
    }
}
