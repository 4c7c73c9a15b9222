// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazily renewed credential shared by all requests of a client.

use std::future::Future;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::Error;

/// A credential with its expiry.
#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Single owned credential cell with serialized renewal.
///
/// Reads are lock-free in practice (a short `parking_lot` read lock). When
/// the credential is missing or expired, callers queue on an async renewal
/// lock; the first one renews, and the ones behind it find a fresh value
/// on their re-check and reuse it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use blueair_lib::protocol::TokenCell;
///
/// # async fn example() -> blueair_lib::Result<()> {
/// let cell: TokenCell<String> = TokenCell::new(Duration::from_secs(3600));
/// let token = cell
///     .get_or_renew(|| async { Ok("fresh-token".to_string()) })
///     .await?;
/// assert_eq!(token, "fresh-token");
/// assert_eq!(cell.current().as_deref(), Some("fresh-token"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenCell<T> {
    current: RwLock<Option<Entry<T>>>,
    renewal: Mutex<()>,
    lifetime: Duration,
}

impl<T: Clone> TokenCell<T> {
    /// Creates an empty cell whose credentials live for `lifetime`.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            current: RwLock::new(None),
            renewal: Mutex::new(()),
            lifetime,
        }
    }

    /// Returns the credential lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Returns the current credential if it has not expired.
    #[must_use]
    pub fn current(&self) -> Option<T> {
        self.current
            .read()
            .as_ref()
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    /// Stores a credential, starting its lifetime now.
    pub fn store(&self, value: T) {
        *self.current.write() = Some(Entry {
            value,
            expires_at: Instant::now() + self.lifetime,
        });
    }

    /// Drops the current credential so the next read renews it.
    pub fn invalidate(&self) {
        *self.current.write() = None;
    }

    /// Drops the current credential only if `rejected` matches it.
    ///
    /// A caller whose credential was refused passes a predicate identifying
    /// that credential. If another caller already renewed it, the newer
    /// value is kept and returns `false`.
    pub fn invalidate_if(&self, rejected: impl FnOnce(&T) -> bool) -> bool {
        let mut current = self.current.write();
        if current.as_ref().is_some_and(|entry| rejected(&entry.value)) {
            *current = None;
            return true;
        }
        false
    }

    /// Returns the current credential, renewing it first if needed.
    ///
    /// # Errors
    ///
    /// Returns the renewal error; the cell is left empty in that case.
    pub async fn get_or_renew<F, Fut>(&self, renew: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        if let Some(value) = self.current() {
            return Ok(value);
        }

        let _guard = self.renewal.lock().await;

        // Someone ahead of us in the queue may have renewed already
        if let Some(value) = self.current() {
            return Ok(value);
        }

        tracing::debug!("Renewing access token");
        let value = renew().await?;
        self.store(value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::AuthError;

    #[tokio::test]
    async fn renews_when_empty() {
        let cell = TokenCell::new(Duration::from_secs(60));
        assert!(cell.current().is_none());

        let token = cell
            .get_or_renew(|| async { Ok("a".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "a");
        assert_eq!(cell.current().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn valid_token_is_reused() {
        let cell = TokenCell::new(Duration::from_secs(60));
        cell.store("cached".to_string());

        let token = cell
            .get_or_renew(|| async { Ok("renewed".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "cached");
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_is_renewed() {
        let cell = TokenCell::new(Duration::from_secs(60));
        cell.store("old".to_string());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cell.current().is_none());

        let token = cell
            .get_or_renew(|| async { Ok("new".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "new");
    }

    #[tokio::test]
    async fn failed_renewal_leaves_cell_empty() {
        let cell: TokenCell<String> = TokenCell::new(Duration::from_secs(60));
        let result = cell
            .get_or_renew(|| async { Err(AuthError::Rejected.into()) })
            .await;

        assert!(matches!(result, Err(Error::Auth(AuthError::Rejected))));
        assert!(cell.current().is_none());
    }

    #[tokio::test]
    async fn invalidate_forces_renewal() {
        let cell = TokenCell::new(Duration::from_secs(60));
        cell.store("old".to_string());
        cell.invalidate();

        let token = cell
            .get_or_renew(|| async { Ok("new".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "new");
    }

    #[tokio::test]
    async fn stale_rejection_keeps_renewed_token() {
        let cell = TokenCell::new(Duration::from_secs(60));
        let renewals = AtomicUsize::new(0);
        let renew = || async {
            let n = renewals.fetch_add(1, Ordering::SeqCst) + 2;
            Ok(format!("t{n}"))
        };
        cell.store("t1".to_string());

        // Both callers were refused with t1; the first renews
        assert!(cell.invalidate_if(|token| token == "t1"));
        let a = cell.get_or_renew(renew).await.unwrap();

        assert!(!cell.invalidate_if(|token| token == "t1"));
        let b = cell.get_or_renew(renew).await.unwrap();

        assert_eq!(a, "t2");
        assert_eq!(b, "t2");
        assert_eq!(renewals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_if_on_empty_cell() {
        let cell: TokenCell<String> = TokenCell::new(Duration::from_secs(60));
        assert!(!cell.invalidate_if(|_| true));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_renew_once() {
        let cell = Arc::new(TokenCell::new(Duration::from_secs(60)));
        let renewals = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cell = Arc::clone(&cell);
            let renewals = Arc::clone(&renewals);
            handles.push(tokio::spawn(async move {
                cell.get_or_renew(|| async move {
                    let n = renewals.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(format!("token-{n}"))
                })
                .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "token-0");
        }
        assert_eq!(renewals.load(Ordering::SeqCst), 1);
    }
}
