//! Non-fungible token consumer: per-id ownership, URIs, and rescue of
//! stray fungible balances, all gated by the embedded ACL domain

use std::sync::Arc;

use log::debug;
use primitive_types::U256;

use crate::acl::AccessControl;
use crate::error::{Error, Result, TokenError, TokenResult};
use crate::roles::{
    FEATURE_BURNS_ON_BEHALF, FEATURE_OWN_BURNS, FEATURE_TRANSFERS, FEATURE_TRANSFERS_ON_BEHALF,
    ROLE_RESCUE_MANAGER, ROLE_TOKEN_CREATOR, ROLE_TOKEN_DESTROYER, ROLE_URI_MANAGER,
};
use crate::store::{Principal, Store};
use crate::token::Token;

/// A non-fungible token collection with its own ACL domain
pub struct Nft {
    acl: AccessControl,
}

impl Nft {
    pub fn deploy(store: &Arc<Store>, deployer: Principal) -> Result<Self> {
        Ok(Nft {
            acl: AccessControl::deploy(store, deployer)?,
        })
    }

    /// The collection's ACL domain
    #[inline]
    pub fn acl(&self) -> &AccessControl {
        &self.acl
    }

    /// The collection's own account, used as the holder of stray
    /// fungible balances subject to [`Nft::rescue_erc20`]
    #[inline]
    pub fn account(&self) -> Principal {
        self.acl.id()
    }

    pub fn exists(&self, token_id: u64) -> Result<bool> {
        let id = self.acl.id();
        self.acl
            .store()
            .read(|s, tx| Ok(s.owner_get(tx, id, token_id)?.is_some()))
    }

    pub fn owner_of(&self, token_id: u64) -> TokenResult<Principal> {
        let id = self.acl.id();
        self.acl
            .store()
            .read(|s, tx| s.owner_get(tx, id, token_id).map_err(TokenError::from))?
            .ok_or(TokenError::NonExistent)
    }

    /// Operator approved for one token, if any
    pub fn approved(&self, token_id: u64) -> Result<Option<Principal>> {
        let id = self.acl.id();
        self.acl.store().read(|s, tx| s.approval_get(tx, id, token_id))
    }

    /// Create token `token_id` owned by `to`. Requires
    /// `ROLE_TOKEN_CREATOR`; duplicate ids are rejected.
    pub fn mint(&self, by: Principal, to: Principal, token_id: u64) -> TokenResult<()> {
        self.acl.require_role(by, ROLE_TOKEN_CREATOR)?;
        let id = self.acl.id();
        self.acl.store().write(|s, tx| {
            if s.owner_get(tx, id, token_id)?.is_some() {
                return Err(TokenError::AlreadyExists);
            }
            s.owner_put(tx, id, token_id, to).map_err(TokenError::from)
        })?;
        debug!("nft {}: {} minted #{} to {}", id, by, token_id, to);
        Ok(())
    }

    /// Approve `operator` to move one token; caller must be the owner
    pub fn approve(&self, by: Principal, operator: Principal, token_id: u64) -> TokenResult<()> {
        if self.owner_of(token_id)? != by {
            return Err(TokenError::IncorrectOwner);
        }
        let id = self.acl.id();
        self.acl
            .store()
            .write(|s, tx| s.approval_put(tx, id, token_id, operator))?;
        Ok(())
    }

    /// Move a token. The owner moves under `FEATURE_TRANSFERS`; the
    /// approved operator under `FEATURE_TRANSFERS_ON_BEHALF`. Clears the
    /// token approval.
    pub fn transfer_from(
        &self,
        by: Principal,
        from: Principal,
        to: Principal,
        token_id: u64,
    ) -> TokenResult<()> {
        let owner = self.owner_of(token_id)?;
        if owner != from {
            return Err(TokenError::IncorrectOwner);
        }
        if by == owner {
            if !self.acl.is_feature_enabled(FEATURE_TRANSFERS)? {
                return Err(TokenError::TransfersDisabled);
            }
        } else {
            if self.approved(token_id)? != Some(by) {
                return Err(TokenError::NotApproved);
            }
            if !self.acl.is_feature_enabled(FEATURE_TRANSFERS_ON_BEHALF)? {
                return Err(TokenError::TransfersOnBehalfDisabled);
            }
        }
        let id = self.acl.id();
        self.acl.store().write(|s, tx| {
            s.approval_del(tx, id, token_id)?;
            s.owner_put(tx, id, token_id, to)
        })?;
        debug!("nft {}: {} moved #{} from {} to {}", id, by, token_id, from, to);
        Ok(())
    }

    /// Destroy a token. A `ROLE_TOKEN_DESTROYER` burns unconditionally;
    /// the owner needs `FEATURE_OWN_BURNS`; the approved operator needs
    /// `FEATURE_BURNS_ON_BEHALF`; anyone else is denied.
    pub fn burn(&self, by: Principal, token_id: u64) -> TokenResult<()> {
        let owner = self.owner_of(token_id)?;
        if !self.acl.is_operator_in_role(by, ROLE_TOKEN_DESTROYER)? {
            if by == owner {
                if !self.acl.is_feature_enabled(FEATURE_OWN_BURNS)? {
                    return Err(TokenError::BurnsDisabled);
                }
            } else if self.approved(token_id)? == Some(by) {
                if !self.acl.is_feature_enabled(FEATURE_BURNS_ON_BEHALF)? {
                    return Err(TokenError::BurnsOnBehalfDisabled);
                }
            } else {
                return Err(TokenError::Acl(Error::AccessDenied));
            }
        }
        let id = self.acl.id();
        self.acl.store().write(|s, tx| {
            s.owner_del(tx, id, token_id)?;
            s.approval_del(tx, id, token_id)?;
            s.uri_del(tx, id, token_id)?;
            Ok::<_, Error>(())
        })?;
        debug!("nft {}: {} burned #{}", id, by, token_id);
        Ok(())
    }

    /// Base part of every token URI. Requires `ROLE_URI_MANAGER`.
    pub fn set_base_uri(&self, by: Principal, uri: &str) -> Result<()> {
        self.acl.require_role(by, ROLE_URI_MANAGER)?;
        let key = format!("base_uri:{}", self.acl.id());
        self.acl.store().write(|s, tx| s.meta_put(tx, &key, uri))
    }

    pub fn base_uri(&self) -> Result<String> {
        let key = format!("base_uri:{}", self.acl.id());
        self.acl
            .store()
            .read(|s, tx| Ok(s.meta_get(tx, &key)?.unwrap_or_default()))
    }

    /// Per-token URI override. Requires `ROLE_URI_MANAGER` and an
    /// existing token.
    pub fn set_token_uri(&self, by: Principal, token_id: u64, uri: &str) -> TokenResult<()> {
        self.acl.require_role(by, ROLE_URI_MANAGER)?;
        if !self.exists(token_id)? {
            return Err(TokenError::NonExistent);
        }
        let id = self.acl.id();
        self.acl
            .store()
            .write(|s, tx| s.uri_put(tx, id, token_id, uri))?;
        Ok(())
    }

    /// Token URI: base followed by the override, or by the decimal id
    /// when no override is set
    pub fn token_uri(&self, token_id: u64) -> TokenResult<String> {
        if !self.exists(token_id)? {
            return Err(TokenError::NonExistent);
        }
        let id = self.acl.id();
        let suffix = self
            .acl
            .store()
            .read(|s, tx| s.uri_get(tx, id, token_id))?
            .unwrap_or_else(|| token_id.to_string());
        Ok(format!("{}{}", self.base_uri()?, suffix))
    }

    /// Recover a stray fungible balance held by the collection's own
    /// account. Requires `ROLE_RESCUE_MANAGER` on this collection; the
    /// transfer itself runs under the rescued token's own rules.
    pub fn rescue_erc20(
        &self,
        by: Principal,
        token: &Token,
        to: Principal,
        value: U256,
    ) -> TokenResult<()> {
        self.acl.require_role(by, ROLE_RESCUE_MANAGER)?;
        token.transfer(self.account(), to, value)
    }

    /// Passthroughs to the collection's ACL domain
    pub fn update_features(&self, by: Principal, requested: U256) -> Result<U256> {
        self.acl.update_features(by, requested)
    }

    pub fn update_role(&self, by: Principal, to: Principal, requested: U256) -> Result<U256> {
        self.acl.update_role(by, to, requested)
    }
}
