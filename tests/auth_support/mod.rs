#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ignite::auth::{AuthError, CredentialPair, TokenStore};

#[derive(Default)]
pub struct InMemoryTokenStore {
    pair: Mutex<Option<CredentialPair>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(access_token: &str, refresh_token: &str) -> Self {
        Self {
            pair: Mutex::new(Some(CredentialPair::new(access_token, refresh_token))),
        }
    }

    pub fn get(&self) -> Option<CredentialPair> {
        self.pair.lock().expect("store lock poisoned").clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>, AuthError> {
        Ok(self.get().filter(CredentialPair::is_complete))
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        *self.pair.lock().expect("store lock poisoned") = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.pair.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Counts how often the session was signed out.
#[derive(Clone, Default)]
pub struct SignOutCounter(Arc<AtomicUsize>);

impl SignOutCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn hook(&self) -> impl Fn() + Send + Sync + 'static {
        let counter = Arc::clone(&self.0);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}
