//! Turns a filtered transaction into exactly one [`TradeEvent`].

use std::sync::Arc;

use async_trait::async_trait;
use solana_pubkey::Pubkey;

use crate::codec::address::redact;
use crate::codec::token::TokenAccount;
use crate::collection::CollectionIndex;
use crate::error::Error;
use crate::instruction::decode_transaction;
use crate::marketplaces::{Candidate, Marketplace, MarketplaceSchema, schema_for};
use crate::price::Lamports;
use crate::types::{RawTransaction, Signature};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeKind {
    Listed {
        seller: Pubkey,
        mint: Pubkey,
        label: String,
        price: Lamports,
    },
    Delisted {
        owner: Pubkey,
        mint: Pubkey,
        label: String,
    },
    Sold {
        buyer: Pubkey,
        seller: Pubkey,
        mint: Pubkey,
        label: String,
        price: Lamports,
    },
    Unrecognized {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeEvent {
    pub marketplace: Marketplace,
    pub signature: Signature,
    pub kind: TradeKind,
}

impl TradeEvent {
    pub fn is_recognized(&self) -> bool {
        !matches!(self.kind, TradeKind::Unrecognized { .. })
    }
}

/// Resolves a token account to its `(mint, owner)` pair.
#[async_trait]
pub trait TokenAccountSource: Send + Sync {
    /// `Ok(None)` when the account does not exist.
    async fn token_account(&self, address: &Pubkey) -> Result<Option<TokenAccount>, Error>;
}

pub struct Classifier {
    schema: &'static dyn MarketplaceSchema,
    index: Arc<CollectionIndex>,
    accounts: Arc<dyn TokenAccountSource>,
}

impl Classifier {
    pub fn new(
        marketplace: Marketplace,
        index: Arc<CollectionIndex>,
        accounts: Arc<dyn TokenAccountSource>,
    ) -> Self {
        Self {
            schema: schema_for(marketplace),
            index,
            accounts,
        }
    }

    pub fn marketplace(&self) -> Marketplace {
        self.schema.marketplace()
    }

    /// Classification never fails; anything that does not fit becomes
    /// [`TradeKind::Unrecognized`].
    pub async fn classify(&self, tx: &RawTransaction) -> TradeEvent {
        let kind = match self.resolve(tx).await {
            Ok(kind) => kind,
            Err(reason) => {
                tracing::info!(
                    marketplace = %self.marketplace(),
                    signature = %tx.signature,
                    %reason,
                    "unrecognized transaction"
                );
                TradeKind::Unrecognized { reason }
            }
        };
        TradeEvent {
            marketplace: self.marketplace(),
            signature: tx.signature.clone(),
            kind,
        }
    }

    async fn resolve(&self, tx: &RawTransaction) -> Result<TradeKind, String> {
        let top = decode_transaction(tx).map_err(|e| e.to_string())?;
        match self.schema.match_shape(&top)? {
            Candidate::Delisting { token_account } => {
                let account = self
                    .accounts
                    .token_account(&token_account)
                    .await
                    .map_err(|e| format!("token account {token_account}: {e}"))?
                    .ok_or_else(|| format!("token account {token_account} not found"))?;
                Ok(TradeKind::Delisted {
                    owner: account.owner,
                    mint: account.mint,
                    label: self.label(&account.mint),
                })
            }
            Candidate::Sale {
                buyer,
                seller,
                mint,
                price,
            } => Ok(TradeKind::Sold {
                buyer,
                seller,
                mint,
                label: self.label(&mint),
                price,
            }),
            Candidate::Listing {
                seller,
                mint,
                price,
            } => Ok(TradeKind::Listed {
                seller,
                mint,
                label: self.label(&mint),
                price,
            }),
        }
    }

    /// Collection display name, or the redacted mint when the index does not
    /// know it.
    pub fn label(&self, mint: &Pubkey) -> String {
        match self.index.lookup(mint) {
            Some(entry) => entry.display_name().to_string(),
            None => redact(&mint.to_string()),
        }
    }
}
