//! One human-readable line per trade event.

use std::fmt;

use tokio::sync::mpsc;

use crate::classify::{TradeEvent, TradeKind};
use crate::codec::address::redact;

pub const EXPLORER_TX_URL: &str = "https://solscan.io/tx/";

/// Renders a [`TradeEvent`] as a single log line.
pub struct ReportLine<'a>(pub &'a TradeEvent);

impl fmt::Display for ReportLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = self.0;
        write!(f, "[{}] ", event.marketplace)?;
        match &event.kind {
            TradeKind::Listed {
                seller,
                label,
                price,
                ..
            } => write!(
                f,
                "LISTED → {} LISTED {label} FOR {price}",
                redact(&seller.to_string())
            )?,
            TradeKind::Delisted { owner, label, .. } => write!(
                f,
                "UNLISTED → {} REMOVED LISTING FOR {label}",
                redact(&owner.to_string())
            )?,
            TradeKind::Sold {
                buyer,
                seller,
                label,
                price,
                ..
            } => write!(
                f,
                "SOLD → {} BOUGHT {label} FROM {} FOR {price}",
                redact(&buyer.to_string()),
                redact(&seller.to_string())
            )?,
            TradeKind::Unrecognized { reason } => write!(f, "UNRECOGNIZED ({reason})")?,
        }
        write!(f, " → {EXPLORER_TX_URL}{}", event.signature)
    }
}

/// Drain `events` until every sender is gone. Unrecognized transactions are
/// already logged by the classifier and only counted here.
pub async fn run_reporter(mut events: mpsc::Receiver<TradeEvent>) -> usize {
    let mut reported = 0;
    while let Some(event) = events.recv().await {
        if event.is_recognized() {
            tracing::info!(
                marketplace = %event.marketplace,
                signature = %event.signature,
                "{}",
                ReportLine(&event)
            );
        } else {
            tracing::debug!(signature = %event.signature, "{}", ReportLine(&event));
        }
        reported += 1;
    }
    reported
}

#[cfg(test)]
mod tests {
    use solana_pubkey::Pubkey;

    use super::*;
    use crate::marketplaces::Marketplace;
    use crate::price::Lamports;

    fn event(kind: TradeKind) -> TradeEvent {
        TradeEvent {
            marketplace: Marketplace::Solanart,
            signature: "5xSig".to_string(),
            kind,
        }
    }

    #[test]
    fn sale_line() {
        let buyer = Pubkey::new_from_array([1u8; 32]);
        let seller = Pubkey::new_from_array([2u8; 32]);
        let line = ReportLine(&event(TradeKind::Sold {
            buyer,
            seller,
            mint: Pubkey::new_from_array([3u8; 32]),
            label: "Cool Cat #7".to_string(),
            price: Lamports(1_050_000_000),
        }))
        .to_string();

        assert_eq!(
            line,
            format!(
                "[Solanart] SOLD → {} BOUGHT Cool Cat #7 FROM {} FOR 1.05 SOL → https://solscan.io/tx/5xSig",
                redact(&buyer.to_string()),
                redact(&seller.to_string())
            )
        );
    }

    #[test]
    fn listing_and_delisting_lines() {
        let who = Pubkey::new_from_array([4u8; 32]);
        let listed = ReportLine(&event(TradeKind::Listed {
            seller: who,
            mint: who,
            label: "Cool Cat #7".to_string(),
            price: Lamports(2_106_000_000),
        }))
        .to_string();
        assert!(listed.contains("LISTED Cool Cat #7 FOR 2.11 SOL"), "{listed}");

        let delisted = ReportLine(&event(TradeKind::Delisted {
            owner: who,
            mint: who,
            label: "Cool Cat #7".to_string(),
        }))
        .to_string();
        assert_eq!(
            delisted,
            format!(
                "[Solanart] UNLISTED → {} REMOVED LISTING FOR Cool Cat #7 → https://solscan.io/tx/5xSig",
                redact(&who.to_string())
            )
        );
    }

    #[tokio::test]
    async fn reporter_drains_until_senders_close() {
        let (tx, rx) = mpsc::channel(4);
        let reporter = tokio::spawn(run_reporter(rx));
        for _ in 0..3 {
            tx.send(event(TradeKind::Unrecognized {
                reason: "odd".to_string(),
            }))
            .await
            .ok();
        }
        drop(tx);
        assert_eq!(reporter.await.ok(), Some(3));
    }
}
