//! Memoized profile resolution.
//!
//! Wraps a [`ProfileService`] with a cache so each address is fetched at
//! most once, collapses concurrent lookups for the same address into a
//! single request, and degrades to an email-derived fallback profile when
//! the service fails or knows nothing. Resolution is infallible: callers
//! always get something renderable.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::watch;

use tutorchat_types::{Email, Profile};

use crate::backend::ProfileService;

enum CacheEntry {
    /// Resolved; subsequent lookups are a clone.
    Ready(Profile),
    /// A fetch is underway; waiters subscribe instead of re-fetching.
    InFlight(watch::Receiver<Option<Profile>>),
}

/// Caching, request-collapsing front for a profile service.
pub struct ProfileEnricher<P> {
    service: P,
    cache: Mutex<HashMap<Email, CacheEntry>>,
}

impl<P: ProfileService> ProfileEnricher<P> {
    pub fn new(service: P) -> Self {
        Self {
            service,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves the profile for an address.
    ///
    /// Cache hit: returns the cached profile. Lookup already in flight:
    /// awaits its result. Otherwise fetches from the service. A fetch
    /// returning `Ok(None)` caches the fallback (the service is
    /// authoritative about unknown addresses); a fetch that errors
    /// returns the fallback without caching it, so a later call retries.
    pub async fn resolve(&self, email: &Email) -> Profile {
        enum Lookup {
            Hit(Profile),
            Wait(watch::Receiver<Option<Profile>>),
            Fetch(watch::Sender<Option<Profile>>),
        }

        // Decide under the lock, act only after its scope has closed; the
        // guard must never span an await point.
        let lookup = {
            let mut cache = self.cache.lock();
            match cache.get(email) {
                Some(CacheEntry::Ready(profile)) => Lookup::Hit(profile.clone()),
                Some(CacheEntry::InFlight(rx)) => Lookup::Wait(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    cache.insert(email.clone(), CacheEntry::InFlight(rx));
                    Lookup::Fetch(tx)
                }
            }
        };

        let mut rx = match lookup {
            Lookup::Hit(profile) => return profile,
            Lookup::Fetch(tx) => return self.fetch_and_publish(email, &tx).await,
            Lookup::Wait(rx) => rx,
        };

        loop {
            if let Some(profile) = rx.borrow_and_update().clone() {
                return profile;
            }
            if rx.changed().await.is_err() {
                // The fetch was abandoned without publishing; evict the
                // dead entry so the next lookup goes back to the service.
                let mut cache = self.cache.lock();
                if let Some(CacheEntry::InFlight(cached)) = cache.get(email)
                    && cached.same_channel(&rx)
                {
                    cache.remove(email);
                }
                return Profile::fallback(email);
            }
        }
    }

    async fn fetch_and_publish(&self, email: &Email, tx: &watch::Sender<Option<Profile>>) -> Profile {
        let profile = match self.service.fetch_profile(email).await {
            Ok(Some(profile)) => {
                self.cache
                    .lock()
                    .insert(email.clone(), CacheEntry::Ready(profile.clone()));
                profile
            }
            Ok(None) => {
                tracing::debug!(email = %email, "no profile on record, caching fallback");
                let fallback = Profile::fallback(email);
                self.cache
                    .lock()
                    .insert(email.clone(), CacheEntry::Ready(fallback.clone()));
                fallback
            }
            Err(error) => {
                tracing::warn!(email = %email, %error, "profile fetch failed, using fallback");
                self.cache.lock().remove(email);
                Profile::fallback(email)
            }
        };
        let _ = tx.send(Some(profile.clone()));
        profile
    }

    /// Pre-resolves a batch of addresses concurrently.
    pub async fn warm(&self, emails: &[Email]) {
        futures_util::future::join_all(emails.iter().map(|email| self.resolve(email))).await;
    }

    /// Returns the cached profile for an address without fetching.
    #[must_use]
    pub fn cached(&self, email: &Email) -> Option<Profile> {
        match self.cache.lock().get(email) {
            Some(CacheEntry::Ready(profile)) => Some(profile.clone()),
            _ => None,
        }
    }
}
