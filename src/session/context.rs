// Process-wide session identity, shared by the pipeline, history controller and manager

use crate::models::Session;
use crate::utils::lock_mutex_recover;
use std::sync::{Arc, Mutex};

/// Result of an activation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Activation {
    Activated,
    /// The same identity was already active; nothing changed
    Unchanged,
    /// A different identity holds the session
    Conflict(String),
}

/// Handle to the current session identity.
///
/// Cloning shares the underlying state. Only the session manager can activate
/// or clear it; every other component reads the identity at the moment it
/// needs one.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    identity: Arc<Mutex<Option<String>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current identity, or `None` when anonymous
    pub fn identity(&self) -> Option<String> {
        lock_mutex_recover(&self.identity).clone()
    }

    pub fn is_active(&self) -> bool {
        lock_mutex_recover(&self.identity).is_some()
    }

    pub fn snapshot(&self) -> Session {
        match self.identity() {
            Some(identity) => Session {
                identity,
                active: true,
            },
            None => Session::anonymous(),
        }
    }

    /// Activate `identity` if the context is anonymous.
    ///
    /// `persist` runs under the lock before the identity becomes visible, so a
    /// persistence failure leaves the context anonymous.
    pub(crate) fn activate_with<E>(
        &self,
        identity: &str,
        persist: impl FnOnce() -> Result<(), E>,
    ) -> Result<Activation, E> {
        let mut current = lock_mutex_recover(&self.identity);
        match current.as_deref() {
            Some(existing) if existing == identity => Ok(Activation::Unchanged),
            Some(existing) => Ok(Activation::Conflict(existing.to_string())),
            None => {
                persist()?;
                *current = Some(identity.to_string());
                Ok(Activation::Activated)
            }
        }
    }

    /// Clear the identity and return what was there.
    /// Exactly one caller observes `Some` per activation.
    pub(crate) fn take(&self) -> Option<String> {
        lock_mutex_recover(&self.identity).take()
    }
}
