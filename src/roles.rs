//! Role and feature bit constants
//!
//! A role mask is a single 256-bit integer: every bit is an independent
//! permission. Bits 0-15 are feature bits (global per-instance toggles),
//! bits 16 and up are role bits (per-principal permissions). The split is
//! a convention for callers, the engine itself never checks it.

use primitive_types::U256;

/// Access manager: may grant/revoke roles and toggle features,
/// bounded by its own mask (bit 255)
pub const ROLE_ACCESS_MANAGER: U256 = U256([0, 0, 0, 1 << 63]);

/// Upgrade manager: may swap the implementation pointer behind
/// an upgradeable instance (bit 254)
pub const ROLE_UPGRADE_MANAGER: U256 = U256([0, 0, 0, 1 << 62]);

/// All 256 permission bits set: the super admin mask, held initially
/// by the deployer
pub const FULL_PRIVILEGES_MASK: U256 = U256([u64::MAX, u64::MAX, u64::MAX, u64::MAX]);

/// Enables direct token transfers (transfer by the token holder itself)
pub const FEATURE_TRANSFERS: U256 = U256([0x0000_0001, 0, 0, 0]);

/// Enables transfers on behalf (transfer by an approved operator)
pub const FEATURE_TRANSFERS_ON_BEHALF: U256 = U256([0x0000_0002, 0, 0, 0]);

/// Enables token holders to burn their own tokens
pub const FEATURE_OWN_BURNS: U256 = U256([0x0000_0008, 0, 0, 0]);

/// Enables approved operators to burn tokens on behalf of their holders
pub const FEATURE_BURNS_ON_BEHALF: U256 = U256([0x0000_0010, 0, 0, 0]);

/// All 16 feature bits enabled
pub const FEATURE_ALL: U256 = U256([0x0000_FFFF, 0, 0, 0]);

/// Token creator: may mint tokens to an arbitrary account
pub const ROLE_TOKEN_CREATOR: U256 = U256([0x0001_0000, 0, 0, 0]);

/// Token destroyer: may burn tokens held by an arbitrary account
pub const ROLE_TOKEN_DESTROYER: U256 = U256([0x0002_0000, 0, 0, 0]);

/// URI manager: may update base URI and per-token URIs
pub const ROLE_URI_MANAGER: U256 = U256([0x0010_0000, 0, 0, 0]);

/// Rescue manager: may recover stray fungible balances held by
/// the contract instance itself
pub const ROLE_RESCUE_MANAGER: U256 = U256([0x0020_0000, 0, 0, 0]);

/// Ownership manager: adapter-side role guarding ownership transfer
/// of the proxied legacy target
pub const ROLE_OWNERSHIP_MANAGER: U256 = U256([0x0001_0000, 0, 0, 0]);

/// Complement of a permission set against the full mask
#[inline]
pub fn not(mask: U256) -> U256 {
    FULL_PRIVILEGES_MASK ^ mask
}
