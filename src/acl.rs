//! Access control engine: per-principal role masks and a per-instance
//! feature mask, updated under the caller's own authority
//!
//! The update rule is the heart of the model: for every bit the caller
//! holds, the target mask takes the requested value; for every bit the
//! caller lacks, the target mask keeps its current value. A caller can
//! therefore never grant a bit it does not hold, and cannot reliably
//! clear a bit it does not hold either - removal and grant are the same
//! primitive. With a fresh (zero) target this reduces to plain
//! intersection: `requested & caller_mask`.
//!
//! Bit 255 (`ROLE_ACCESS_MANAGER`) gates the update operations themselves
//! and is not specially protected: an access manager may revoke its own
//! manager bit, after which no call of that account can restore it. If it
//! was the last manager, the instance becomes permanently unmanageable -
//! an operational hazard, not an error the engine detects.

use std::sync::{Arc, Mutex};

use log::debug;
use primitive_types::U256;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::roles::{FULL_PRIVILEGES_MASK, ROLE_ACCESS_MANAGER};
use crate::store::{Principal, Store};

/// Change records emitted by gated updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    /// `roles[to]` changed: `requested` is what the caller asked for,
    /// `actual` what its authority allowed through
    RoleUpdated {
        by: Principal,
        to: Principal,
        requested: U256,
        actual: U256,
    },
    /// Adapter: the required role for `selector` was (re)configured
    AccessRoleUpdated { selector: [u8; 4], role: U256 },
    /// Upgrade gate: the implementation pointer was swapped
    Upgraded { implementation: u64 },
}

/// One authorization domain: a set of principal role masks plus one
/// feature mask, persisted in the injected [`Store`]
pub struct AccessControl {
    store: Arc<Store>,
    id: u64,
    events: Mutex<Vec<Event>>,
}

impl AccessControl {
    /// Create a fresh instance; `deployer` starts with the full
    /// privileges mask, everyone else at zero
    pub fn deploy(store: &Arc<Store>, deployer: Principal) -> Result<Self> {
        let id = store.new_instance()?;
        store.write(|s, tx| s.role_put(tx, id, deployer, FULL_PRIVILEGES_MASK))?;
        debug!("acl {}: deployed, {} holds full privileges", id, deployer);
        Ok(AccessControl {
            store: Arc::clone(store),
            id,
            events: Mutex::new(Vec::new()),
        })
    }

    /// Instance id; also this instance's own principal id
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Raw role mask of a principal
    pub fn get_role(&self, principal: Principal) -> Result<U256> {
        self.store.read(|s, tx| s.role_get(tx, self.id, principal))
    }

    /// Feature mask of this instance (the instance's own role slot)
    pub fn features(&self) -> Result<U256> {
        self.get_role(self.id)
    }

    /// What `target` would become if `operator` requested `desired`:
    /// operator-held bits follow the request, the rest stay put
    pub fn evaluate_by(&self, operator: Principal, target: U256, desired: U256) -> Result<U256> {
        let p = self.get_role(operator)?;
        Ok((target | (p & desired)) & !(p & !desired))
    }

    /// True iff the principal holds at least one of the required bits
    pub fn is_operator_in_role(&self, principal: Principal, required: U256) -> Result<bool> {
        Ok(!(self.get_role(principal)? & required).is_zero())
    }

    /// True iff at least one of the required feature bits is enabled
    pub fn is_feature_enabled(&self, required: U256) -> Result<bool> {
        self.is_operator_in_role(self.id, required)
    }

    /// Check a required role, mapping failure to [`Error::AccessDenied`]
    pub fn require_role(&self, by: Principal, required: U256) -> Result<()> {
        if self.is_operator_in_role(by, required)? {
            Ok(())
        } else {
            Err(Error::AccessDenied)
        }
    }

    /// Set the role mask of `to`, bounded by the caller's own authority.
    /// Requires `by` to hold `ROLE_ACCESS_MANAGER`. Returns the mask
    /// actually assigned.
    pub fn update_role(&self, by: Principal, to: Principal, requested: U256) -> Result<U256> {
        self.require_role(by, ROLE_ACCESS_MANAGER)?;
        let actual = self.store.write(|s, tx| {
            let current = s.role_get(tx, self.id, to)?;
            let p = s.role_get(tx, self.id, by)?;
            let actual = (current | (p & requested)) & !(p & !requested);
            s.role_put(tx, self.id, to, actual)?;
            Ok::<_, Error>(actual)
        })?;
        debug!(
            "acl {}: {} set role of {}: requested {:#x}, assigned {:#x}",
            self.id, by, to, requested, actual
        );
        self.record(Event::RoleUpdated { by, to, requested, actual });
        Ok(actual)
    }

    /// Set this instance's feature mask, bounded by the caller's own
    /// authority; same gating and algorithm as [`Self::update_role`]
    pub fn update_features(&self, by: Principal, requested: U256) -> Result<U256> {
        self.update_role(by, self.id, requested)
    }

    pub(crate) fn record(&self, event: Event) {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).push(event);
    }

    /// Take all change records emitted since the last drain
    pub fn drain_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|p| p.into_inner()))
    }
}
