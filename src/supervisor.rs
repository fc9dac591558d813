//! Wires one poller per marketplace to a shared reporter.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::classify::{Classifier, TokenAccountSource};
use crate::collection::CollectionIndex;
use crate::error::Error;
use crate::ledger::poller::{DEFAULT_MAX_TRANSACTION_AGE, LedgerPoller};
use crate::ledger::{LedgerAccounts, LedgerRpc, RetryPolicy};
use crate::marketplaces::Marketplace;
use crate::report::run_reporter;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub struct Supervisor {
    rpc: Arc<dyn LedgerRpc>,
    index: Arc<CollectionIndex>,
    retry: RetryPolicy,
    max_age: Duration,
    cancel: CancellationToken,
}

/// Running watchers. Cancel through [`Watchers::cancellation`], then
/// [`Watchers::join`].
pub struct Watchers {
    cancel: CancellationToken,
    pollers: Vec<(Marketplace, JoinHandle<Result<(), Error>>)>,
    reporter: JoinHandle<usize>,
}

impl Supervisor {
    pub fn new(rpc: Arc<dyn LedgerRpc>, index: Arc<CollectionIndex>) -> Self {
        Self {
            rpc,
            index,
            retry: RetryPolicy::default(),
            max_age: DEFAULT_MAX_TRANSACTION_AGE,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Spawn a watcher task per marketplace and a single reporter task.
    pub fn start(self, marketplaces: &[Marketplace]) -> Watchers {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let reporter = tokio::spawn(run_reporter(events_rx));

        let accounts: Arc<dyn TokenAccountSource> = Arc::new(LedgerAccounts::new(
            self.rpc.clone(),
            self.retry,
            self.cancel.clone(),
        ));

        let pollers = marketplaces
            .iter()
            .map(|&marketplace| {
                let classifier = Classifier::new(marketplace, self.index.clone(), accounts.clone());
                let poller = LedgerPoller::new(
                    self.rpc.clone(),
                    classifier,
                    events_tx.clone(),
                    self.retry,
                    self.cancel.clone(),
                )
                .with_max_age(self.max_age);
                tracing::info!(%marketplace, program_id = %marketplace.program_id(), "starting watcher");
                (marketplace, tokio::spawn(poller.run()))
            })
            .collect();

        Watchers {
            cancel: self.cancel,
            pollers,
            reporter,
        }
    }
}

impl Watchers {
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for every watcher to stop, then for the reporter to drain.
    /// Returns the number of events reported.
    pub async fn join(self) -> usize {
        for (marketplace, handle) in self.pollers {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(%marketplace, error = %e, "watcher failed"),
                Err(e) => tracing::error!(%marketplace, error = %e, "watcher task panicked"),
            }
        }
        match self.reporter.await {
            Ok(reported) => reported,
            Err(e) => {
                tracing::error!(error = %e, "reporter task panicked");
                0
            }
        }
    }

    /// Cancel and wait.
    pub async fn shutdown(self) -> usize {
        self.cancel.cancel();
        self.join().await
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::ledger::stub::StubLedger;

    #[tokio::test]
    async fn watchers_stop_on_cancellation() {
        let ledger = Arc::new(StubLedger::default());
        let watchers = Supervisor::new(ledger.clone(), Arc::new(CollectionIndex::default()))
            .with_retry(RetryPolicy::immediate())
            .start(&Marketplace::all());

        tokio::task::yield_now().await;
        let reported = watchers.shutdown().await;

        assert_eq!(reported, 0);
        assert!(ledger.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn external_token_cancels_watchers() {
        let cancel = CancellationToken::new();
        let watchers = Supervisor::new(
            Arc::new(StubLedger::default()),
            Arc::new(CollectionIndex::default()),
        )
        .with_retry(RetryPolicy::immediate())
        .with_cancellation(cancel.clone())
        .start(&[Marketplace::Solanart]);

        assert!(!watchers.cancellation().is_cancelled());
        cancel.cancel();
        assert_eq!(watchers.join().await, 0);
    }
}
