//! Cursor-tracked polling of one marketplace program.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use solana_pubkey::Pubkey;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::classify::{Classifier, TradeEvent};
use crate::error::Error;
use crate::ledger::{LedgerRpc, RetryPolicy, pause};
use crate::marketplaces::Marketplace;
use crate::types::{RawTransaction, Signature};

pub const DEFAULT_MAX_TRANSACTION_AGE: Duration = Duration::from_secs(300);

/// Newest signature whose batch has been fully walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub address: Pubkey,
    pub last: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing newer than the cursor.
    Idle,
    Drained {
        processed: usize,
        skipped: usize,
        cursor: Signature,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Stale,
    Failed,
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

pub struct LedgerPoller {
    marketplace: Marketplace,
    rpc: Arc<dyn LedgerRpc>,
    classifier: Classifier,
    events: mpsc::Sender<TradeEvent>,
    retry: RetryPolicy,
    max_age: Duration,
    cancel: CancellationToken,
    cursor: Cursor,
    now: Clock,
}

impl LedgerPoller {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        classifier: Classifier,
        events: mpsc::Sender<TradeEvent>,
        retry: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        let marketplace = classifier.marketplace();
        Self {
            marketplace,
            rpc,
            classifier,
            events,
            retry,
            max_age: DEFAULT_MAX_TRANSACTION_AGE,
            cancel,
            cursor: Cursor {
                address: marketplace.program_id(),
                last: None,
            },
            now: Box::new(unix_now),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Replace the wall clock (unix seconds).
    pub fn with_clock(mut self, now: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.now = Box::new(now);
        self
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Point the cursor at the most recent existing signature without
    /// processing it. An empty history leaves the cursor unset.
    pub async fn bootstrap(&mut self) -> Result<(), Error> {
        let newest = self.signatures(None, Some(1)).await?;
        self.cursor.last = newest.into_iter().next();
        tracing::info!(
            marketplace = %self.marketplace,
            cursor = self.cursor.last.as_deref().unwrap_or("<none>"),
            "watcher bootstrapped"
        );
        Ok(())
    }

    /// One poll: fetch everything newer than the cursor, walk it oldest
    /// first, then advance the cursor to the newest signature of the batch.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let until = self.cursor.last.clone();
        let batch = self.signatures(until.as_deref(), None).await?;
        let Some(newest) = batch.first().cloned() else {
            return Ok(PollOutcome::Idle);
        };
        tracing::debug!(marketplace = %self.marketplace, count = batch.len(), "draining batch");

        let mut processed = 0;
        let mut skipped = 0;
        for signature in batch.iter().rev() {
            let tx = self.confirmed_transaction(signature).await?;
            match self.filter(&tx) {
                Some(reason) => {
                    tracing::debug!(marketplace = %self.marketplace, %signature, ?reason, "skipping transaction");
                    skipped += 1;
                }
                None => {
                    let event = self.classifier.classify(&tx).await;
                    if self.cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    self.events.send(event).await.map_err(|_| Error::Cancelled)?;
                    processed += 1;
                }
            }
            pause(&self.cancel, self.retry.rate_limit).await?;
        }

        self.cursor.last = Some(newest.clone());
        Ok(PollOutcome::Drained {
            processed,
            skipped,
            cursor: newest,
        })
    }

    /// Bootstrap, then poll until cancelled.
    pub async fn run(mut self) -> Result<(), Error> {
        let result = self.run_inner().await;
        match result {
            Err(Error::Cancelled) => {
                tracing::info!(marketplace = %self.marketplace, "watcher stopped");
                Ok(())
            }
            other => other,
        }
    }

    async fn run_inner(&mut self) -> Result<(), Error> {
        self.bootstrap().await?;
        loop {
            if let PollOutcome::Idle = self.poll_once().await? {
                pause(&self.cancel, self.retry.idle_interval).await?;
            }
        }
    }

    fn filter(&self, tx: &RawTransaction) -> Option<Skip> {
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        if tx.age_secs((self.now)()).is_some_and(|age| age > max_age) {
            return Some(Skip::Stale);
        }
        if tx.execution_failed() {
            return Some(Skip::Failed);
        }
        None
    }

    async fn signatures(&self, until: Option<&str>, limit: Option<usize>) -> Result<Vec<Signature>, Error> {
        loop {
            match self
                .rpc
                .signatures_for_address(&self.cursor.address, until, limit)
                .await
            {
                Ok(signatures) => return Ok(signatures),
                Err(e) if e.is_transport() => {
                    tracing::warn!(marketplace = %self.marketplace, error = %e, "signature fetch failed, retrying");
                    pause(&self.cancel, self.retry.transport_retry).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch until the node returns the transaction with a block time.
    async fn confirmed_transaction(&self, signature: &str) -> Result<RawTransaction, Error> {
        loop {
            match self.rpc.transaction(signature).await {
                Ok(Some(tx)) if tx.block_time.is_some() => return Ok(tx),
                Ok(_) => {
                    tracing::debug!(marketplace = %self.marketplace, %signature, "transaction not yet available");
                }
                Err(e) if e.is_transport() => {
                    tracing::warn!(marketplace = %self.marketplace, %signature, error = %e, "transaction fetch failed, retrying");
                }
                Err(e) => return Err(e),
            }
            pause(&self.cancel, self.retry.transport_retry).await?;
        }
    }
}
