//! Persistence collaborators.
//!
//! The ceremony layer never talks to storage directly; it goes through
//! these traits so deployments can plug in whatever backend they run.
//! The in-memory implementations here exist for tests and demos and make
//! no durability claims.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::Authenticator;
use crate::error::WebauthnError;
use crate::proto::{Challenge, CredentialID};

/// Storage for registered credentials.
///
/// Implementations must treat credential ids as opaque bytes and must
/// never deduplicate or normalize them.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// All credentials registered to a user.
    async fn find_by_username(&self, user_name: &str)
        -> Result<Vec<Authenticator>, WebauthnError>;

    /// All credentials with this credential id, across all users. The
    /// ceremony layer requires exactly one match; returning the full set
    /// lets it distinguish an unknown credential from a colliding one.
    async fn find_by_credential_id(
        &self,
        credential_id: &CredentialID,
    ) -> Result<Vec<Authenticator>, WebauthnError>;

    /// Persist a newly registered credential.
    async fn insert(&self, authenticator: Authenticator) -> Result<(), WebauthnError>;

    /// Persist a new counter value for a credential. Implementations
    /// backed by shared storage should make the update conditional on the
    /// stored counter still being below `counter` and report a conflict
    /// as an error.
    async fn update_counter(
        &self,
        credential_id: &CredentialID,
        counter: u32,
    ) -> Result<(), WebauthnError>;
}

/// Storage for outstanding ceremony challenges.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Record an issued challenge for a user. Implementations should
    /// expire challenges after the ceremony timeout; expiry looks like
    /// consumption to the ceremony layer.
    async fn issue(&self, user_name: &str, challenge: Challenge) -> Result<(), WebauthnError>;

    /// Atomically remove and return the challenge for a user. `None`
    /// means nothing was outstanding, which the ceremony layer treats as
    /// reuse or expiry. The returned value is compared against the
    /// client's claim by the caller, so a mismatched ceremony still burns
    /// the challenge.
    async fn consume(&self, user_name: &str) -> Result<Option<Challenge>, WebauthnError>;
}

/// A process-local credential store.
#[derive(Debug, Default)]
pub struct EphemeralCredentialStore {
    creds: Mutex<BTreeMap<CredentialID, Authenticator>>,
}

impl EphemeralCredentialStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for EphemeralCredentialStore {
    async fn find_by_username(
        &self,
        user_name: &str,
    ) -> Result<Vec<Authenticator>, WebauthnError> {
        let creds = self
            .creds
            .lock()
            .map_err(|_| WebauthnError::StoreFailure("credential lock poisoned".to_string()))?;
        Ok(creds
            .values()
            .filter(|a| a.user_name == user_name)
            .cloned()
            .collect())
    }

    async fn find_by_credential_id(
        &self,
        credential_id: &CredentialID,
    ) -> Result<Vec<Authenticator>, WebauthnError> {
        let creds = self
            .creds
            .lock()
            .map_err(|_| WebauthnError::StoreFailure("credential lock poisoned".to_string()))?;
        Ok(creds.get(credential_id).cloned().into_iter().collect())
    }

    async fn insert(&self, authenticator: Authenticator) -> Result<(), WebauthnError> {
        let mut creds = self
            .creds
            .lock()
            .map_err(|_| WebauthnError::StoreFailure("credential lock poisoned".to_string()))?;
        if creds.contains_key(&authenticator.credential_id) {
            return Err(WebauthnError::CredentialAlreadyExists);
        }
        creds.insert(authenticator.credential_id.clone(), authenticator);
        Ok(())
    }

    async fn update_counter(
        &self,
        credential_id: &CredentialID,
        counter: u32,
    ) -> Result<(), WebauthnError> {
        let mut creds = self
            .creds
            .lock()
            .map_err(|_| WebauthnError::StoreFailure("credential lock poisoned".to_string()))?;
        let auth = creds
            .get_mut(credential_id)
            .ok_or(WebauthnError::UnknownCredential)?;
        if auth.counter != 0 && counter <= auth.counter {
            // Another assertion raced us past this value.
            return Err(WebauthnError::CounterRegression);
        }
        auth.counter = counter;
        Ok(())
    }
}

/// A process-local challenge store. One outstanding challenge per user;
/// issuing a new one displaces the old. Challenges here never expire, so
/// this store is only suitable for tests and demos.
#[derive(Debug, Default)]
pub struct EphemeralChallengeStore {
    challenges: Mutex<BTreeMap<String, Challenge>>,
}

impl EphemeralChallengeStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for EphemeralChallengeStore {
    async fn issue(&self, user_name: &str, challenge: Challenge) -> Result<(), WebauthnError> {
        let mut challenges = self
            .challenges
            .lock()
            .map_err(|_| WebauthnError::StoreFailure("challenge lock poisoned".to_string()))?;
        challenges.insert(user_name.to_string(), challenge);
        Ok(())
    }

    async fn consume(&self, user_name: &str) -> Result<Option<Challenge>, WebauthnError> {
        let mut challenges = self
            .challenges
            .lock()
            .map_err(|_| WebauthnError::StoreFailure("challenge lock poisoned".to_string()))?;
        Ok(challenges.remove(user_name))
    }
}
