//! Fungible token consumer: balances gated by the embedded ACL domain
//!
//! Every mutating entry point checks a feature or role first, exactly per
//! the gating table: direct transfers behind `FEATURE_TRANSFERS`,
//! transfers on behalf behind `FEATURE_TRANSFERS_ON_BEHALF` plus prior
//! approval, mint behind `ROLE_TOKEN_CREATOR`, burns behind
//! `ROLE_TOKEN_DESTROYER` or the burn features.

use std::sync::Arc;

use log::debug;
use primitive_types::U256;

use crate::acl::AccessControl;
use crate::error::{Result, TokenError, TokenResult};
use crate::roles::{
    FEATURE_BURNS_ON_BEHALF, FEATURE_OWN_BURNS, FEATURE_TRANSFERS, FEATURE_TRANSFERS_ON_BEHALF,
    ROLE_TOKEN_CREATOR, ROLE_TOKEN_DESTROYER,
};
use crate::store::{Principal, Store};

/// Balance slot 0 holds the total supply; principal ids start at 1
const SUPPLY_SLOT: Principal = 0;

/// A fungible token with its own ACL domain. All features start
/// disabled; the deployer enables them via [`Token::update_features`].
pub struct Token {
    acl: AccessControl,
}

impl Token {
    pub fn deploy(store: &Arc<Store>, deployer: Principal) -> Result<Self> {
        Ok(Token {
            acl: AccessControl::deploy(store, deployer)?,
        })
    }

    /// The token's ACL domain
    #[inline]
    pub fn acl(&self) -> &AccessControl {
        &self.acl
    }

    /// The token contract's own account (holds stray balances sent to it)
    #[inline]
    pub fn account(&self) -> Principal {
        self.acl.id()
    }

    pub fn balance_of(&self, account: Principal) -> Result<U256> {
        let id = self.acl.id();
        self.acl.store().read(|s, tx| s.balance_get(tx, id, account))
    }

    pub fn total_supply(&self) -> Result<U256> {
        self.balance_of(SUPPLY_SLOT)
    }

    pub fn allowance(&self, holder: Principal, spender: Principal) -> Result<U256> {
        let id = self.acl.id();
        self.acl
            .store()
            .read(|s, tx| s.allowance_get(tx, id, holder, spender))
    }

    /// Set `spender`'s allowance over the caller's balance
    pub fn approve(&self, by: Principal, spender: Principal, value: U256) -> Result<()> {
        let id = self.acl.id();
        self.acl
            .store()
            .write(|s, tx| s.allowance_put(tx, id, by, spender, value))
    }

    /// Direct transfer by the holder itself; requires `FEATURE_TRANSFERS`
    pub fn transfer(&self, by: Principal, to: Principal, value: U256) -> TokenResult<()> {
        self.transfer_from(by, by, to, value)
    }

    /// Transfer `value` from `from` to `to`. A third-party caller needs
    /// `FEATURE_TRANSFERS_ON_BEHALF` and sufficient allowance.
    pub fn transfer_from(
        &self,
        by: Principal,
        from: Principal,
        to: Principal,
        value: U256,
    ) -> TokenResult<()> {
        if by == from {
            if !self.acl.is_feature_enabled(FEATURE_TRANSFERS)? {
                return Err(TokenError::TransfersDisabled);
            }
        } else if !self.acl.is_feature_enabled(FEATURE_TRANSFERS_ON_BEHALF)? {
            return Err(TokenError::TransfersOnBehalfDisabled);
        }
        let id = self.acl.id();
        self.acl.store().write(|s, tx| {
            if by != from {
                let allowed = s.allowance_get(tx, id, from, by)?;
                if allowed < value {
                    return Err(TokenError::AllowanceExceeded);
                }
                // U256::MAX allowance stays infinite
                if allowed != U256::MAX {
                    s.allowance_put(tx, id, from, by, allowed - value)?;
                }
            }
            Self::move_balance(s, tx, id, from, to, value)
        })?;
        debug!("token {}: {} moved {} from {} to {}", id, by, value, from, to);
        Ok(())
    }

    /// Create `value` tokens on `to`. Requires `ROLE_TOKEN_CREATOR`.
    pub fn mint(&self, by: Principal, to: Principal, value: U256) -> TokenResult<()> {
        self.acl.require_role(by, ROLE_TOKEN_CREATOR)?;
        let id = self.acl.id();
        self.acl.store().write(|s, tx| {
            let supply = s.balance_get(tx, id, SUPPLY_SLOT)?;
            let supply = supply.checked_add(value).ok_or(TokenError::SupplyOverflow)?;
            s.balance_put(tx, id, SUPPLY_SLOT, supply)?;
            let balance = s.balance_get(tx, id, to)?;
            s.balance_put(tx, id, to, balance + value)?;
            Ok::<_, TokenError>(())
        })?;
        debug!("token {}: {} minted {} to {}", id, by, value, to);
        Ok(())
    }

    /// Destroy `value` tokens held by `from`. A `ROLE_TOKEN_DESTROYER`
    /// burns unconditionally; the holder itself needs
    /// `FEATURE_OWN_BURNS`; anyone else needs `FEATURE_BURNS_ON_BEHALF`
    /// plus allowance.
    pub fn burn(&self, by: Principal, from: Principal, value: U256) -> TokenResult<()> {
        let destroyer = self.acl.is_operator_in_role(by, ROLE_TOKEN_DESTROYER)?;
        if !destroyer {
            if by == from {
                if !self.acl.is_feature_enabled(FEATURE_OWN_BURNS)? {
                    return Err(TokenError::BurnsDisabled);
                }
            } else if !self.acl.is_feature_enabled(FEATURE_BURNS_ON_BEHALF)? {
                return Err(TokenError::BurnsOnBehalfDisabled);
            }
        }
        let id = self.acl.id();
        self.acl.store().write(|s, tx| {
            if !destroyer && by != from {
                let allowed = s.allowance_get(tx, id, from, by)?;
                if allowed < value {
                    return Err(TokenError::BurnAllowanceExceeded);
                }
                if allowed != U256::MAX {
                    s.allowance_put(tx, id, from, by, allowed - value)?;
                }
            }
            let balance = s.balance_get(tx, id, from)?;
            if balance < value {
                return Err(TokenError::BalanceExceeded);
            }
            s.balance_put(tx, id, from, balance - value)?;
            let supply = s.balance_get(tx, id, SUPPLY_SLOT)?;
            s.balance_put(tx, id, SUPPLY_SLOT, supply - value)?;
            Ok(())
        })?;
        debug!("token {}: {} burned {} from {}", id, by, value, from);
        Ok(())
    }

    /// Passthroughs to the token's ACL domain
    pub fn update_features(&self, by: Principal, requested: U256) -> Result<U256> {
        self.acl.update_features(by, requested)
    }

    pub fn update_role(&self, by: Principal, to: Principal, requested: U256) -> Result<U256> {
        self.acl.update_role(by, to, requested)
    }

    fn move_balance(
        s: &Store,
        tx: &mut heed::RwTxn,
        id: u64,
        from: Principal,
        to: Principal,
        value: U256,
    ) -> TokenResult<()> {
        let from_balance = s.balance_get(tx, id, from)?;
        if from_balance < value {
            return Err(TokenError::BalanceExceeded);
        }
        s.balance_put(tx, id, from, from_balance - value)?;
        // re-read after the debit so a self-transfer credits what it debited
        let to_balance = s.balance_get(tx, id, to)?;
        s.balance_put(tx, id, to, to_balance + value)?;
        Ok(())
    }
}
