// chbridge-core/src/application/credentials.rs

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::domain::error::DomainError;
use crate::domain::source::Credential;

/// Owns the session credential. Set once after a successful connect, read by every
/// privileged request, cleared on logout, reset or rejection. Share it with
/// `Arc<CredentialHolder>` to let several workflows reuse one session.
#[derive(Debug, Default)]
pub struct CredentialHolder {
    slot: RwLock<Option<Credential>>,
}

impl CredentialHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
        }
    }

    /// Stores a freshly issued credential. Fails if one is already held.
    pub fn issue(&self, credential: Credential) -> Result<(), DomainError> {
        let mut slot = self.write();
        if slot.is_some() {
            return Err(DomainError::Validation(
                "A session credential is already held; log out before connecting again".into(),
            ));
        }
        *slot = Some(credential);
        info!("🔑 Session credential issued");
        Ok(())
    }

    pub fn current(&self) -> Option<Credential> {
        self.read().clone()
    }

    /// Credential for a privileged `operation`. Absence is a local failure and
    /// never reaches the network.
    pub fn require(&self, operation: &str) -> Result<Credential, DomainError> {
        self.current()
            .ok_or_else(|| DomainError::MissingCredential(operation.to_string()))
    }

    pub fn is_issued(&self) -> bool {
        self.read().is_some()
    }

    pub fn clear(&self) {
        if self.write().take().is_some() {
            debug!("Session credential cleared");
        }
    }

    // A poisoned lock still holds a consistent Option: recover it.
    fn read(&self) -> RwLockReadGuard<'_, Option<Credential>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Credential>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}
