//! Core engine tests: the update rule, its gating, and its edge cases
//!
//! The update rule under test: for every bit the caller holds, the
//! target mask takes the requested value; for every bit the caller
//! lacks, the target mask keeps its current value.

use std::sync::Arc;

use rolebits::{
    not, AccessControl, Error, Event, Store, U256, FEATURE_ALL, FEATURE_TRANSFERS,
    FULL_PRIVILEGES_MASK, ROLE_ACCESS_MANAGER, ROLE_TOKEN_CREATOR,
};
use tempfile::TempDir;

// the "players"
const A0: u64 = 100; // deployer, holds all the permissions
const A1: u64 = 101;
const A2: u64 = 102;

fn setup() -> (TempDir, Arc<Store>, AccessControl) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let acl = AccessControl::deploy(&store, A0).unwrap();
    (dir, store, acl)
}

/// Random 255-bit mask: never touches the access manager bit
fn random_bn255() -> U256 {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).unwrap();
    buf[0] &= 0x7f;
    U256::from_big_endian(&buf)
}

// ============================================================================
// Deployment
// ============================================================================

#[test]
fn deployer_holds_full_privileges() {
    let (_dir, _store, acl) = setup();
    assert_eq!(acl.get_role(A0).unwrap(), FULL_PRIVILEGES_MASK);
    assert_eq!(acl.get_role(A1).unwrap(), U256::zero());
    assert!(acl.is_operator_in_role(A0, ROLE_ACCESS_MANAGER).unwrap());
}

#[test]
fn instances_are_isolated() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let a = AccessControl::deploy(&store, A0).unwrap();
    let b = AccessControl::deploy(&store, A1).unwrap();
    // deployer of one domain holds nothing in the other
    assert_eq!(a.get_role(A1).unwrap(), U256::zero());
    assert_eq!(b.get_role(A0).unwrap(), U256::zero());
    a.update_role(A0, A2, ROLE_TOKEN_CREATOR).unwrap();
    assert_eq!(b.get_role(A2).unwrap(), U256::zero());
}

// ============================================================================
// Full-authority manager
// ============================================================================

/// What a fully-privileged manager sets is what the target gets
#[test]
fn what_you_set_is_what_you_get() {
    let (_dir, _store, acl) = setup();
    acl.update_role(A0, A1, FULL_PRIVILEGES_MASK).unwrap();
    acl.drain_events();

    let set = random_bn255();
    let actual = acl.update_role(A1, A2, set).unwrap();
    assert_eq!(actual, set);
    assert_eq!(acl.get_role(A2).unwrap(), set);
    assert_eq!(
        acl.drain_events(),
        vec![Event::RoleUpdated { by: A1, to: A2, requested: set, actual: set }]
    );
}

/// What a fully-privileged manager removes is what gets removed
#[test]
fn what_you_remove_is_what_gets_removed() {
    let (_dir, _store, acl) = setup();
    acl.update_role(A0, A1, FULL_PRIVILEGES_MASK).unwrap();
    acl.update_role(A0, A2, FULL_PRIVILEGES_MASK).unwrap();

    let remove = random_bn255();
    let actual = acl.update_role(A1, A2, not(remove)).unwrap();
    assert_eq!(actual, not(remove));
    assert_eq!(acl.get_role(A2).unwrap(), not(remove));
}

/// Re-assigning the current mask changes nothing
#[test]
fn reassigning_current_mask_is_a_noop() {
    let (_dir, _store, acl) = setup();
    let set = random_bn255();
    acl.update_role(A0, A2, set).unwrap();
    let actual = acl.update_role(A0, A2, acl.get_role(A2).unwrap()).unwrap();
    assert_eq!(actual, set);
    assert_eq!(acl.get_role(A2).unwrap(), set);
}

// ============================================================================
// Manager with no permissions beyond the manager bit
// ============================================================================

/// A bare manager assigns nothing, independently of the request
#[test]
fn bare_manager_assigns_nothing() {
    let (_dir, _store, acl) = setup();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER).unwrap();
    acl.drain_events();

    let set = random_bn255();
    let actual = acl.update_role(A1, A2, set).unwrap();
    assert_eq!(actual, U256::zero());
    assert_eq!(acl.get_role(A2).unwrap(), U256::zero());
    assert_eq!(
        acl.drain_events(),
        vec![Event::RoleUpdated { by: A1, to: A2, requested: set, actual: U256::zero() }]
    );
}

/// A bare manager removes nothing: the target keeps what it had
#[test]
fn bare_manager_removes_nothing() {
    let (_dir, _store, acl) = setup();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER).unwrap();
    acl.update_role(A0, A2, FULL_PRIVILEGES_MASK).unwrap();

    let remove = random_bn255();
    let actual = acl.update_role(A1, A2, not(remove)).unwrap();
    assert_eq!(actual, FULL_PRIVILEGES_MASK);
    assert_eq!(acl.get_role(A2).unwrap(), FULL_PRIVILEGES_MASK);
}

// ============================================================================
// Partially-privileged manager: the intersection law
// ============================================================================

/// On a fresh target, the assigned mask is the intersection of the
/// request and the manager's own mask
#[test]
fn assignment_is_an_intersection() {
    let (_dir, _store, acl) = setup();
    let role = random_bn255();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER | role).unwrap();

    let set = random_bn255();
    let actual = acl.update_role(A1, A2, set).unwrap();
    assert_eq!(actual, role & set);
    assert_eq!(acl.get_role(A2).unwrap(), role & set);
}

/// What gets removed is the intersection of the removal request and the
/// manager's own mask
#[test]
fn removal_is_an_intersection() {
    let (_dir, _store, acl) = setup();
    let role = random_bn255();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER | role).unwrap();
    acl.update_role(A0, A2, FULL_PRIVILEGES_MASK).unwrap();

    let remove = random_bn255();
    let actual = acl.update_role(A1, A2, not(remove)).unwrap();
    assert_eq!(actual, not(role & remove));
    assert_eq!(acl.get_role(A2).unwrap(), not(role & remove));
}

// ============================================================================
// Self-application
// ============================================================================

/// A manager stripping random permissions from itself converges to the
/// manager bit alone; may fail with probability 2^-14 < 0.01%
#[test]
fn self_decay_converges_to_manager_bit() {
    let (_dir, _store, acl) = setup();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER | random_bn255()).unwrap();

    for _ in 0..14 {
        acl.update_role(A1, A1, not(random_bn255())).unwrap();
    }
    assert_eq!(acl.get_role(A1).unwrap(), ROLE_ACCESS_MANAGER);
}

/// A manager may grant the manager bit onward
#[test]
fn manager_can_appoint_another_manager() {
    let (_dir, _store, acl) = setup();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER).unwrap();
    acl.update_role(A1, A2, ROLE_ACCESS_MANAGER).unwrap();
    assert!(acl.is_operator_in_role(A2, ROLE_ACCESS_MANAGER).unwrap());
}

/// Self-revocation of the manager bit is a one-way decay: the account
/// loses all further authority, including over itself
#[test]
fn self_revocation_is_permanent() {
    let (_dir, _store, acl) = setup();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER).unwrap();
    acl.update_role(A1, A1, U256::zero()).unwrap();

    assert!(!acl.is_operator_in_role(A1, ROLE_ACCESS_MANAGER).unwrap());
    assert_eq!(acl.update_role(A1, A1, FULL_PRIVILEGES_MASK), Err(Error::AccessDenied));
    assert_eq!(acl.update_role(A1, A2, FULL_PRIVILEGES_MASK), Err(Error::AccessDenied));
    assert_eq!(acl.update_features(A1, FEATURE_ALL), Err(Error::AccessDenied));
}

// ============================================================================
// No manager bit at all
// ============================================================================

/// Without the manager bit both update operations are rejected and the
/// target state stays untouched
#[test]
fn non_manager_is_denied() {
    let (_dir, _store, acl) = setup();
    let before = acl.get_role(A2).unwrap();

    assert_eq!(acl.update_role(A1, A2, U256::from(1)), Err(Error::AccessDenied));
    assert_eq!(acl.update_features(A1, U256::from(1)), Err(Error::AccessDenied));
    assert_eq!(acl.get_role(A2).unwrap(), before);
    assert_eq!(acl.features().unwrap(), U256::zero());
    assert!(acl.drain_events().is_empty());
}

// ============================================================================
// Features
// ============================================================================

/// Features live in the instance's own role slot and follow the same
/// bounded-update algorithm
#[test]
fn features_follow_the_same_rule() {
    let (_dir, _store, acl) = setup();
    assert_eq!(acl.features().unwrap(), U256::zero());

    let actual = acl.update_features(A0, FEATURE_ALL).unwrap();
    assert_eq!(actual, FEATURE_ALL);
    assert_eq!(acl.features().unwrap(), FEATURE_ALL);
    assert!(acl.is_feature_enabled(FEATURE_TRANSFERS).unwrap());

    // a manager holding only the transfers feature cannot toggle others
    acl.update_features(A0, U256::zero()).unwrap();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER | FEATURE_TRANSFERS).unwrap();
    let actual = acl.update_features(A1, FEATURE_ALL).unwrap();
    assert_eq!(actual, FEATURE_TRANSFERS);
}

/// Evaluation is observable without side effects
#[test]
fn evaluate_by_is_pure() {
    let (_dir, _store, acl) = setup();
    let role = random_bn255();
    acl.update_role(A0, A1, ROLE_ACCESS_MANAGER | role).unwrap();

    let target = random_bn255();
    let desired = random_bn255();
    let p = ROLE_ACCESS_MANAGER | role;
    let expected = (target | (p & desired)) & !(p & !desired);
    assert_eq!(acl.evaluate_by(A1, target, desired).unwrap(), expected);
    // no state was written
    assert_eq!(acl.get_role(A2).unwrap(), U256::zero());
}
