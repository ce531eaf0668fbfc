//! LMDB-backed state: role masks, selector roles, token tables
//!
//! One `Store` owns one LMDB environment. Engine and consumer instances
//! share the store and are told apart by an instance id allocated from a
//! monotonic counter; the instance id doubles as that component's own
//! principal id. No global state: tests open an isolated store each.

use std::path::Path;
use std::sync::Arc;

use byteorder::BigEndian;
use heed::types::{Bytes, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use primitive_types::U256;

use crate::error::{store_err, Error, Result};

/// A principal (account) identifier
pub type Principal = u64;

/// 256-bit mask table: compound bytes key -> 32-byte big-endian value
type MaskDb = Database<Bytes, Bytes>;

/// Compound key of two ids, big-endian so prefix iteration stays ordered
#[inline]
pub(crate) fn key(a: u64, b: u64) -> [u8; 16] {
    let mut k = [0u8; 16];
    k[..8].copy_from_slice(&a.to_be_bytes());
    k[8..].copy_from_slice(&b.to_be_bytes());
    k
}

/// Compound key of three ids
#[inline]
pub(crate) fn key3(a: u64, b: u64, c: u64) -> [u8; 24] {
    let mut k = [0u8; 24];
    k[..8].copy_from_slice(&a.to_be_bytes());
    k[8..16].copy_from_slice(&b.to_be_bytes());
    k[16..].copy_from_slice(&c.to_be_bytes());
    k
}

/// Compound key of an instance id and a 4-byte function selector
#[inline]
pub(crate) fn skey(instance: u64, selector: [u8; 4]) -> [u8; 12] {
    let mut k = [0u8; 12];
    k[..8].copy_from_slice(&instance.to_be_bytes());
    k[8..].copy_from_slice(&selector);
    k
}

#[inline]
fn dec_mask(v: &[u8]) -> Result<U256> {
    if v.len() != 32 {
        return Err(Error::Store(format!("mask value of {} bytes", v.len())));
    }
    Ok(U256::from_big_endian(v))
}

/// Shared persistent state, injected into every engine instance
pub struct Store {
    env: Env,
    /// `(instance, principal)` -> role mask; `(i, i)` is instance `i`'s
    /// feature mask
    roles: MaskDb,
    /// `(instance, selector)` -> required role (adapter)
    selectors: MaskDb,
    /// `(instance, account)` -> fungible balance; `(i, 0)` is total supply
    balances: MaskDb,
    /// `(instance, holder, spender)` -> fungible allowance
    allowances: MaskDb,
    /// `(instance, token_id)` -> owning principal
    owners: Database<Bytes, U64<BigEndian>>,
    /// `(instance, token_id)` -> approved operator
    approvals: Database<Bytes, U64<BigEndian>>,
    /// `(instance, token_id)` -> per-token URI override
    uris: Database<Bytes, Str>,
    /// instance counter, per-instance base URIs
    meta: Database<Str, Str>,
}

impl Store {
    /// Open (creating if needed) the environment at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        std::fs::create_dir_all(&path).map_err(store_err)?;
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1 << 30)
                .max_dbs(8)
                .open(path.as_ref())
                .map_err(store_err)?
        };
        let mut tx = env.write_txn().map_err(store_err)?;
        let roles = env.create_database(&mut tx, Some("roles")).map_err(store_err)?;
        let selectors = env.create_database(&mut tx, Some("selectors")).map_err(store_err)?;
        let balances = env.create_database(&mut tx, Some("balances")).map_err(store_err)?;
        let allowances = env.create_database(&mut tx, Some("allowances")).map_err(store_err)?;
        let owners = env.create_database(&mut tx, Some("owners")).map_err(store_err)?;
        let approvals = env.create_database(&mut tx, Some("approvals")).map_err(store_err)?;
        let uris = env.create_database(&mut tx, Some("uris")).map_err(store_err)?;
        let meta = env.create_database(&mut tx, Some("meta")).map_err(store_err)?;
        tx.commit().map_err(store_err)?;
        Ok(Arc::new(Store {
            env,
            roles,
            selectors,
            balances,
            allowances,
            owners,
            approvals,
            uris,
            meta,
        }))
    }

    /// Allocate a fresh instance id (ids start at 1, so slot 0 stays free
    /// for per-instance bookkeeping)
    pub fn new_instance(&self) -> Result<u64> {
        self.write(|s, tx| {
            let id = match s.meta.get(tx, "next_id").map_err(store_err)? {
                Some(v) => v
                    .parse()
                    .map_err(|_| Error::Store(format!("corrupt instance counter: {v:?}")))?,
                None => 1u64,
            };
            s.meta
                .put(tx, "next_id", &(id + 1).to_string())
                .map_err(store_err)?;
            Ok(id)
        })
    }

    pub(crate) fn read<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        E: From<Error>,
        F: FnOnce(&Self, &RoTxn) -> std::result::Result<T, E>,
    {
        let tx = self.env.read_txn().map_err(store_err).map_err(E::from)?;
        f(self, &tx)
    }

    /// One all-or-nothing state transition: the closure's error discards
    /// every change attempted inside it
    pub(crate) fn write<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        E: From<Error>,
        F: FnOnce(&Self, &mut RwTxn) -> std::result::Result<T, E>,
    {
        let mut tx = self.env.write_txn().map_err(store_err).map_err(E::from)?;
        let r = f(self, &mut tx)?;
        tx.commit().map_err(store_err).map_err(E::from)?;
        Ok(r)
    }

    // Mask tables: absent entries read as zero, a zero write is kept
    // explicit (distinguishing "never set" is never needed, masks only
    // ever decay to zero)

    fn mask_get(&self, tx: &RoTxn, db: &MaskDb, k: &[u8]) -> Result<U256> {
        match db.get(tx, k).map_err(store_err)? {
            Some(v) => dec_mask(v),
            None => Ok(U256::zero()),
        }
    }

    fn mask_put(&self, tx: &mut RwTxn, db: &MaskDb, k: &[u8], v: U256) -> Result<()> {
        db.put(tx, k, &v.to_big_endian()).map_err(store_err)
    }

    pub(crate) fn role_get(&self, tx: &RoTxn, instance: u64, principal: Principal) -> Result<U256> {
        self.mask_get(tx, &self.roles, &key(instance, principal))
    }

    pub(crate) fn role_put(
        &self,
        tx: &mut RwTxn,
        instance: u64,
        principal: Principal,
        mask: U256,
    ) -> Result<()> {
        self.mask_put(tx, &self.roles, &key(instance, principal), mask)
    }

    /// Adapter selector role; `None` when never configured
    pub(crate) fn selector_get(
        &self,
        tx: &RoTxn,
        instance: u64,
        selector: [u8; 4],
    ) -> Result<Option<U256>> {
        match self.selectors.get(tx, &skey(instance, selector)).map_err(store_err)? {
            Some(v) => Ok(Some(dec_mask(v)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn selector_put(
        &self,
        tx: &mut RwTxn,
        instance: u64,
        selector: [u8; 4],
        role: U256,
    ) -> Result<()> {
        self.mask_put(tx, &self.selectors, &skey(instance, selector), role)
    }

    pub(crate) fn balance_get(&self, tx: &RoTxn, instance: u64, account: Principal) -> Result<U256> {
        self.mask_get(tx, &self.balances, &key(instance, account))
    }

    pub(crate) fn balance_put(
        &self,
        tx: &mut RwTxn,
        instance: u64,
        account: Principal,
        value: U256,
    ) -> Result<()> {
        self.mask_put(tx, &self.balances, &key(instance, account), value)
    }

    pub(crate) fn allowance_get(
        &self,
        tx: &RoTxn,
        instance: u64,
        holder: Principal,
        spender: Principal,
    ) -> Result<U256> {
        self.mask_get(tx, &self.allowances, &key3(instance, holder, spender))
    }

    pub(crate) fn allowance_put(
        &self,
        tx: &mut RwTxn,
        instance: u64,
        holder: Principal,
        spender: Principal,
        value: U256,
    ) -> Result<()> {
        self.mask_put(tx, &self.allowances, &key3(instance, holder, spender), value)
    }

    pub(crate) fn owner_get(&self, tx: &RoTxn, instance: u64, token_id: u64) -> Result<Option<Principal>> {
        self.owners.get(tx, &key(instance, token_id)).map_err(store_err)
    }

    pub(crate) fn owner_put(
        &self,
        tx: &mut RwTxn,
        instance: u64,
        token_id: u64,
        owner: Principal,
    ) -> Result<()> {
        self.owners.put(tx, &key(instance, token_id), &owner).map_err(store_err)
    }

    pub(crate) fn owner_del(&self, tx: &mut RwTxn, instance: u64, token_id: u64) -> Result<bool> {
        self.owners.delete(tx, &key(instance, token_id)).map_err(store_err)
    }

    pub(crate) fn approval_get(
        &self,
        tx: &RoTxn,
        instance: u64,
        token_id: u64,
    ) -> Result<Option<Principal>> {
        self.approvals.get(tx, &key(instance, token_id)).map_err(store_err)
    }

    pub(crate) fn approval_put(
        &self,
        tx: &mut RwTxn,
        instance: u64,
        token_id: u64,
        operator: Principal,
    ) -> Result<()> {
        self.approvals.put(tx, &key(instance, token_id), &operator).map_err(store_err)
    }

    pub(crate) fn approval_del(&self, tx: &mut RwTxn, instance: u64, token_id: u64) -> Result<bool> {
        self.approvals.delete(tx, &key(instance, token_id)).map_err(store_err)
    }

    pub(crate) fn uri_get(&self, tx: &RoTxn, instance: u64, token_id: u64) -> Result<Option<String>> {
        Ok(self
            .uris
            .get(tx, &key(instance, token_id))
            .map_err(store_err)?
            .map(|s| s.to_string()))
    }

    pub(crate) fn uri_put(
        &self,
        tx: &mut RwTxn,
        instance: u64,
        token_id: u64,
        uri: &str,
    ) -> Result<()> {
        self.uris.put(tx, &key(instance, token_id), uri).map_err(store_err)
    }

    pub(crate) fn uri_del(&self, tx: &mut RwTxn, instance: u64, token_id: u64) -> Result<bool> {
        self.uris.delete(tx, &key(instance, token_id)).map_err(store_err)
    }

    pub(crate) fn meta_get(&self, tx: &RoTxn, k: &str) -> Result<Option<String>> {
        Ok(self.meta.get(tx, k).map_err(store_err)?.map(|s| s.to_string()))
    }

    pub(crate) fn meta_put(&self, tx: &mut RwTxn, k: &str, v: &str) -> Result<()> {
        self.meta.put(tx, k, v).map_err(store_err)
    }
}
