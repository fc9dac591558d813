pub mod poller;
pub mod rpc;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_pubkey::Pubkey;
use tokio_util::sync::CancellationToken;

use crate::classify::TokenAccountSource;
use crate::codec::token::{TokenAccount, decode_token_account};
use crate::error::Error;
use crate::types::{RawTransaction, Signature};

/// Read access to a ledger node. Failures are [`Error::Transport`].
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Signatures involving `address`, newest first, stopping before `until`.
    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        until: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Signature>, Error>;

    /// `Ok(None)` while the node has not confirmed the transaction.
    async fn transaction(&self, signature: &str) -> Result<Option<RawTransaction>, Error>;

    /// `Ok(None)` when the account does not exist.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub transport_retry: Duration,
    pub idle_interval: Duration,
    pub rate_limit: Duration,
    pub account_retry: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            transport_retry: Duration::from_secs(1),
            idle_interval: Duration::from_secs(10),
            rate_limit: Duration::from_secs(1),
            account_retry: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// No waiting anywhere.
    pub fn immediate() -> Self {
        Self {
            transport_retry: Duration::ZERO,
            idle_interval: Duration::ZERO,
            rate_limit: Duration::ZERO,
            account_retry: Duration::ZERO,
        }
    }
}

/// Sleep for `duration` unless cancelled first.
pub(crate) async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<(), Error> {
    if duration.is_zero() {
        tokio::task::yield_now().await;
        return if cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        () = cancel.cancelled() => Err(Error::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Token accounts fetched through a [`LedgerRpc`], retrying transport
/// failures until they succeed or the watcher is cancelled.
pub struct LedgerAccounts {
    rpc: Arc<dyn LedgerRpc>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl LedgerAccounts {
    pub fn new(rpc: Arc<dyn LedgerRpc>, retry: RetryPolicy, cancel: CancellationToken) -> Self {
        Self { rpc, retry, cancel }
    }

    pub async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, Error> {
        loop {
            match self.rpc.account_data(address).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_transport() => {
                    tracing::warn!(account = %address, error = %e, "account fetch failed, retrying");
                    pause(&self.cancel, self.retry.account_retry).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl TokenAccountSource for LedgerAccounts {
    async fn token_account(&self, address: &Pubkey) -> Result<Option<TokenAccount>, Error> {
        self.account_data(address)
            .await?
            .map(|data| decode_token_account(&data))
            .transpose()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
pub(crate) mod stub {
    //! In-memory ledger for driving pollers and classifiers in tests.

    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct StubLedger {
        /// Every signature the program has, newest first.
        pub history: Mutex<Vec<Signature>>,
        pub transactions: Mutex<HashMap<Signature, RawTransaction>>,
        pub accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
        /// Queued failures, consumed one per call before answering normally.
        pub transport_failures: Mutex<VecDeque<&'static str>>,
        /// Transaction fetches that answer `None` before the real answer.
        pub unconfirmed: Mutex<HashMap<Signature, usize>>,
        pub fetched: Mutex<Vec<Signature>>,
    }

    impl StubLedger {
        pub fn push(&self, tx: RawTransaction) {
            self.history.lock().unwrap().insert(0, tx.signature.clone());
            self.transactions.lock().unwrap().insert(tx.signature.clone(), tx);
        }

        fn fail_next(&self) -> Result<(), Error> {
            match self.transport_failures.lock().unwrap().pop_front() {
                Some(reason) => Err(Error::Transport {
                    reason: reason.to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl LedgerRpc for StubLedger {
        async fn signatures_for_address(
            &self,
            _address: &Pubkey,
            until: Option<&str>,
            limit: Option<usize>,
        ) -> Result<Vec<Signature>, Error> {
            self.fail_next()?;
            let history = self.history.lock().unwrap();
            let newer = history
                .iter()
                .take_while(|sig| Some(sig.as_str()) != until)
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect();
            Ok(newer)
        }

        async fn transaction(&self, signature: &str) -> Result<Option<RawTransaction>, Error> {
            self.fail_next()?;
            self.fetched.lock().unwrap().push(signature.to_string());
            if let Some(remaining) = self.unconfirmed.lock().unwrap().get_mut(signature)
                && *remaining > 0
            {
                *remaining -= 1;
                return Ok(None);
            }
            Ok(self.transactions.lock().unwrap().get(signature).cloned())
        }

        async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, Error> {
            self.fail_next()?;
            Ok(self.accounts.lock().unwrap().get(address).cloned())
        }
    }
}
