#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod classify;
pub mod codec;
pub mod collection;
pub mod config;
pub mod error;
pub mod instruction;
pub mod ledger;
pub mod marketplaces;
pub mod price;
pub mod report;
pub mod supervisor;
pub mod types;

pub use classify::{Classifier, TokenAccountSource, TradeEvent, TradeKind};
pub use codec::address::{
    decode_address, encode_address, find_program_derived_address,
    find_program_derived_address_with,
};
pub use codec::metadata::{MetadataAccountRecord, decode_metadata_account, metadata_address};
pub use codec::token::{TokenAccount, decode_token_account};
pub use collection::{CollectionEntry, CollectionIndex};
pub use config::ObserverConfig;
pub use error::Error;
pub use instruction::{FieldValue, InstructionNode, decode_transaction};
pub use ledger::poller::{Cursor, LedgerPoller, PollOutcome};
pub use ledger::{LedgerRpc, RetryPolicy};
pub use marketplaces::{Marketplace, MarketplaceSchema, schema_for};
pub use price::Lamports;
pub use report::ReportLine;
pub use supervisor::{Supervisor, Watchers};
pub use types::{RawTransaction, Signature};
