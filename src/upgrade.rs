//! Upgrade gate: `ROLE_UPGRADE_MANAGER`-gated implementation pointer
//!
//! Only the authorization decision lives here. Storage layout of a real
//! proxy, delegation and re-initialization guards belong to the hosting
//! proxy collaborator.

use std::sync::Arc;

use log::debug;
use primitive_types::U256;

use crate::acl::{AccessControl, Event};
use crate::error::Result;
use crate::roles::ROLE_UPGRADE_MANAGER;
use crate::store::{Principal, Store};

/// An upgradeable ACL domain: the engine plus a swappable code pointer
pub struct UpgradeableAccessControl {
    acl: AccessControl,
}

impl UpgradeableAccessControl {
    pub fn deploy(store: &Arc<Store>, deployer: Principal) -> Result<Self> {
        Ok(UpgradeableAccessControl {
            acl: AccessControl::deploy(store, deployer)?,
        })
    }

    /// The underlying ACL domain
    #[inline]
    pub fn acl(&self) -> &AccessControl {
        &self.acl
    }

    /// Current implementation pointer, if ever set
    pub fn implementation(&self) -> Result<Option<u64>> {
        let key = format!("impl:{}", self.acl.id());
        self.acl
            .store()
            .read(|s, tx| Ok(s.meta_get(tx, &key)?.and_then(|v| v.parse().ok())))
    }

    /// Swap the implementation pointer. Requires `ROLE_UPGRADE_MANAGER`.
    pub fn upgrade_to(&self, by: Principal, implementation: u64) -> Result<()> {
        self.acl.require_role(by, ROLE_UPGRADE_MANAGER)?;
        let key = format!("impl:{}", self.acl.id());
        self.acl
            .store()
            .write(|s, tx| s.meta_put(tx, &key, &implementation.to_string()))?;
        debug!("acl {}: {} upgraded implementation to {}", self.acl.id(), by, implementation);
        self.acl.record(Event::Upgraded { implementation });
        Ok(())
    }

    /// Passthrough to the underlying ACL domain
    pub fn update_role(&self, by: Principal, to: Principal, requested: U256) -> Result<U256> {
        self.acl.update_role(by, to, requested)
    }
}
