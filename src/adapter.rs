//! Ownable-to-ACL adapter
//!
//! Bridges a legacy single-owner collaborator onto the bitmask engine:
//! the adapter is recorded as the target's owner, and relays calls to it
//! on behalf of principals holding the per-selector access role. A
//! selector with no configured role is unreachable through the adapter.

use std::sync::Arc;

use log::debug;
use primitive_types::U256;
use sha3::{Digest, Keccak256};

use crate::acl::{AccessControl, Event};
use crate::error::{Error, Result};
use crate::roles::ROLE_ACCESS_MANAGER;
use crate::store::{Principal, Store};

/// 4-byte function selector
pub type Selector = [u8; 4];

/// Selector of a canonical function signature, e.g.
/// `"transferOwnership(address)"`: first four bytes of its Keccak-256
pub fn selector(signature: &str) -> Selector {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// The legacy collaborator behind the adapter. A non-payable function
/// must reject a nonzero `value`; any error string becomes
/// [`Error::ExecutionFailed`] on the adapter side.
pub trait Callable {
    fn call(
        &mut self,
        selector: Selector,
        payload: &[u8],
        value: U256,
    ) -> std::result::Result<Vec<u8>, String>;
}

/// Adapter instance: its own ACL domain plus the proxied target
pub struct OwnableToAclAdapter<T: Callable> {
    acl: AccessControl,
    target: T,
}

impl<T: Callable> OwnableToAclAdapter<T> {
    /// Deploy the adapter in front of `target`; `deployer` starts with
    /// full privileges on the adapter's own ACL domain
    pub fn deploy(store: &Arc<Store>, deployer: Principal, target: T) -> Result<Self> {
        Ok(OwnableToAclAdapter {
            acl: AccessControl::deploy(store, deployer)?,
            target,
        })
    }

    /// The adapter's own ACL domain
    #[inline]
    pub fn acl(&self) -> &AccessControl {
        &self.acl
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Configure the role required to call `signature` through the
    /// adapter. Requires `ROLE_ACCESS_MANAGER`. Returns the selector.
    pub fn update_access_role(
        &self,
        by: Principal,
        signature: &str,
        role: U256,
    ) -> Result<Selector> {
        self.acl.require_role(by, ROLE_ACCESS_MANAGER)?;
        let sel = selector(signature);
        let id = self.acl.id();
        self.acl
            .store()
            .write(|s, tx| s.selector_put(tx, id, sel, role))?;
        debug!(
            "adapter {}: access role for {} ({:02x?}) set to {:#x}",
            id, signature, sel, role
        );
        self.acl.record(Event::AccessRoleUpdated { selector: sel, role });
        Ok(sel)
    }

    /// Role required for a selector; zero when never configured
    pub fn access_role(&self, sel: Selector) -> Result<U256> {
        let id = self.acl.id();
        self.acl
            .store()
            .read(|s, tx| Ok(s.selector_get(tx, id, sel)?.unwrap_or_default()))
    }

    /// Relay a call to the target as the adapter's own identity.
    /// Fails with `AccessRoleNotSet` when the selector has no configured
    /// role, `AccessDenied` when the caller lacks it, and
    /// `ExecutionFailed` when the target rejects the call (including a
    /// nonzero value sent to a non-payable function).
    pub fn execute(
        &mut self,
        by: Principal,
        sel: Selector,
        payload: &[u8],
        value: U256,
    ) -> Result<Vec<u8>> {
        let required = self.access_role(sel)?;
        if required.is_zero() {
            return Err(Error::AccessRoleNotSet);
        }
        self.acl.require_role(by, required)?;
        let id = self.acl.id();
        self.target.call(sel, payload, value).map_err(|reason| {
            debug!("adapter {}: target rejected {:02x?}: {}", id, sel, reason);
            Error::ExecutionFailed
        })
    }

    /// Passthrough to the adapter's own ACL domain
    pub fn update_role(&self, by: Principal, to: Principal, requested: U256) -> Result<U256> {
        self.acl.update_role(by, to, requested)
    }
}
