//! Rolebits - bitmask role and feature access control
//!
//! One 256-bit integer per principal encodes up to 256 independent
//! permissions. Bit 255 is the access manager meta-authority, bit 254
//! the upgrade manager; bits 0-15 are per-instance feature toggles and
//! bits 16+ per-principal roles by convention. Updates are bounded by
//! the caller's own mask, so authority only ever flows downhill.
//!
//! State lives in LMDB ([`Store`]) and is injected into every
//! [`AccessControl`] instance; nothing is process-global.

mod acl;
mod adapter;
mod error;
mod nft;
mod roles;
mod store;
mod token;
mod upgrade;

pub use acl::{AccessControl, Event};
pub use adapter::{selector, Callable, OwnableToAclAdapter, Selector};
pub use error::{Error, Result, TokenError, TokenResult};
pub use nft::Nft;
pub use roles::{
    not, FEATURE_ALL, FEATURE_BURNS_ON_BEHALF, FEATURE_OWN_BURNS, FEATURE_TRANSFERS,
    FEATURE_TRANSFERS_ON_BEHALF, FULL_PRIVILEGES_MASK, ROLE_ACCESS_MANAGER,
    ROLE_OWNERSHIP_MANAGER, ROLE_RESCUE_MANAGER, ROLE_TOKEN_CREATOR, ROLE_TOKEN_DESTROYER,
    ROLE_UPGRADE_MANAGER, ROLE_URI_MANAGER,
};
pub use store::{Principal, Store};
pub use token::Token;
pub use upgrade::UpgradeableAccessControl;

pub use primitive_types::U256;
