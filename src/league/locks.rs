use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::Scope;

/// Lazily created mutex per key.
#[derive(Debug)]
struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Hash + Eq> KeyedLocks<K> {
    async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// One writer per league. Every mutation of a league's ledger, standings,
/// registrations or pending reports runs while holding its guard.
///
/// Opening and closing leagues changes which league a scope points to, so
/// those hold the scope guard first and the league guard second. Nothing
/// takes them in the other order.
#[derive(Debug, Default)]
pub struct LeagueLocks {
    leagues: KeyedLocks<i64>,
    scopes: KeyedLocks<Scope>,
}

impl LeagueLocks {
    pub async fn acquire(&self, league_id: i64) -> OwnedMutexGuard<()> {
        self.leagues.acquire(league_id).await
    }

    pub async fn acquire_scope(&self, scope: Scope) -> OwnedMutexGuard<()> {
        self.scopes.acquire(scope).await
    }
}
