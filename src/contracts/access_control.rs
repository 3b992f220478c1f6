// src/contracts/access_control.rs
//! Issuer-capability gate.
//!
//! Answers whether a principal may issue or revoke credentials. Membership is
//! self-governed: only existing issuers may grant or withdraw the capability.
//! Instances are independent, so tests can build registries with distinct
//! principal sets side by side.

use crate::error::RegistryError;
use crate::storage::PrincipalStore;
use ethers::types::Address;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccessControl {
    principals: Arc<dyn PrincipalStore>,
}

impl AccessControl {
    /// Builds the gate over `principals`, seeding it with `deployer` if the
    /// set has never been initialized.
    pub fn new(principals: Arc<dyn PrincipalStore>, deployer: Address) -> Result<Self, RegistryError> {
        Self::with_initial_issuers(principals, deployer, &[])
    }

    /// Like [`AccessControl::new`], also seeding `initial` alongside the deployer.
    ///
    /// A set reopened from persistent storage keeps whatever membership it had,
    /// and neither `deployer` nor `initial` is added back.
    pub fn with_initial_issuers(
        principals: Arc<dyn PrincipalStore>,
        deployer: Address,
        initial: &[Address],
    ) -> Result<Self, RegistryError> {
        let mut seed = vec![deployer];
        seed.extend(initial.iter().copied().filter(|p| *p != deployer));
        if principals.seed(&seed)? {
            log::info!("seeded issuer capability for {:?}", seed);
        } else {
            log::debug!("issuer set already initialized; deployer {:?} not reseeded", deployer);
        }
        Ok(Self { principals })
    }

    /// Pure membership lookup.
    pub fn is_issuer(&self, principal: &Address) -> Result<bool, RegistryError> {
        Ok(self.principals.contains(principal)?)
    }

    /// Fails with [`RegistryError::Unauthorized`] unless `caller` is an issuer.
    pub fn ensure_issuer(&self, caller: &Address) -> Result<(), RegistryError> {
        if self.is_issuer(caller)? {
            Ok(())
        } else {
            log::warn!("rejected call from non-issuer {:?}", caller);
            Err(RegistryError::Unauthorized(*caller))
        }
    }

    /// Grants the capability to `principal`. Returns `true` if it was newly granted.
    pub fn grant_issuer(&self, caller: &Address, principal: Address) -> Result<bool, RegistryError> {
        self.ensure_issuer(caller)?;
        Ok(self.principals.insert(principal)?)
    }

    /// Withdraws the capability from `principal`. Returns `true` if it was held.
    ///
    /// An issuer may withdraw its own capability.
    pub fn revoke_issuer(&self, caller: &Address, principal: &Address) -> Result<bool, RegistryError> {
        self.ensure_issuer(caller)?;
        Ok(self.principals.remove(principal)?)
    }

    /// Current issuer set.
    pub fn issuers(&self) -> Result<Vec<Address>, RegistryError> {
        Ok(self.principals.list()?)
    }
}
