#![expect(
    clippy::unwrap_used,
    clippy::panic,
    reason = "test code uses unwrap/panic for concise assertions"
)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use nft_market_observer::codec::address::{parse_address, redact};
use nft_market_observer::{
    Classifier, CollectionIndex, Error, Lamports, Marketplace, RawTransaction, ReportLine,
    TokenAccount, TokenAccountSource, TradeKind, decode_transaction,
};
use solana_pubkey::Pubkey;

const SELLER: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const BUYER: &str = "7dHbWXmci3dT8UFYWYZweBLXgycu7Y3iL6trKn1Y7ARj";
const TOKEN_ACCOUNT: &str = "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So";
const COOL_CAT_7: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
const UNINDEXED_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_transaction(filename: &str) -> RawTransaction {
    let path = fixtures_dir().join("transactions").join(filename);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&data).unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn load_index() -> Arc<CollectionIndex> {
    let dir = fixtures_dir().join("datasets");
    Arc::new(CollectionIndex::load(&dir, &["cool-cats", "other-things"]).unwrap())
}

fn address(value: &str) -> Pubkey {
    parse_address(value).unwrap()
}

struct FixedAccounts(HashMap<Pubkey, TokenAccount>);

#[async_trait]
impl TokenAccountSource for FixedAccounts {
    async fn token_account(&self, address: &Pubkey) -> Result<Option<TokenAccount>, Error> {
        Ok(self.0.get(address).copied())
    }
}

fn classifier(marketplace: Marketplace, mint_in_escrow: &str) -> Classifier {
    let accounts = FixedAccounts(HashMap::from([(
        address(TOKEN_ACCOUNT),
        TokenAccount {
            mint: address(mint_in_escrow),
            owner: address(SELLER),
        },
    )]));
    Classifier::new(marketplace, load_index(), Arc::new(accounts))
}

// ──────────────────── collection datasets ────────────────────

#[test]
fn datasets_drop_ambiguous_ids_and_keep_first_mint() {
    let index = load_index();

    // cool-cats: 7, 8 kept, both id 12 entries dropped; other-things: #1
    // collides with Cool Cat #7 and loses, #2 kept
    assert_eq!(index.len(), 3);
    let cat = index.lookup(&address(COOL_CAT_7)).unwrap();
    assert_eq!(cat.name, "Cool Cat #7");
    assert_eq!(cat.attributes.len(), 2);
    assert_eq!(cat.arweave_uri.as_deref(), Some("https://arweave.net/meta7"));
    assert!(
        index
            .lookup(&address("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"))
            .is_none()
    );
    assert_eq!(
        index
            .lookup(&address("Vote111111111111111111111111111111111111111"))
            .unwrap()
            .address
            .as_deref(),
        Some("SysvarRent111111111111111111111111111111111")
    );
}

#[test]
fn missing_dataset_fails_the_load() {
    let dir = fixtures_dir().join("datasets");
    assert!(matches!(
        CollectionIndex::load(&dir, &["cool-cats", "no-such-set"]),
        Err(Error::DatasetUnreadable { dataset, .. }) if dataset == "no-such-set"
    ));
}

// ──────────────────── instruction trees ────────────────────

#[test]
fn fixtures_decode_into_named_fields() {
    let tree = decode_transaction(&load_transaction("solanart_sale.json")).unwrap();

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].children.len(), 4);
    assert_eq!(tree[0].children[3].name, "InitializeAccount");
    assert_eq!(tree[0].children[3].address("Mint"), Some(address(COOL_CAT_7)));
    let payment = &tree[1].children[1];
    assert_eq!(payment.name, "Transfer");
    assert_eq!(payment.address("From Account"), Some(address(BUYER)));
    assert_eq!(payment.number("Amount"), Some(1_000_000_000));
}

// ──────────────────── classification ────────────────────

#[tokio::test]
async fn solanart_delisting_with_known_mint() {
    let event = classifier(Marketplace::Solanart, COOL_CAT_7)
        .classify(&load_transaction("solanart_delist.json"))
        .await;

    assert_eq!(
        event.kind,
        TradeKind::Delisted {
            owner: address(SELLER),
            mint: address(COOL_CAT_7),
            label: "Cool Cat #7".to_string(),
        }
    );
}

#[tokio::test]
async fn solanart_delisting_with_unknown_mint_uses_redacted_label() {
    let event = classifier(Marketplace::Solanart, UNINDEXED_MINT)
        .classify(&load_transaction("solanart_delist.json"))
        .await;

    let TradeKind::Delisted { label, .. } = &event.kind else {
        panic!("expected a delisting, got {:?}", event.kind);
    };
    assert_eq!(label, "EPjFW...TDt1v");
    assert_eq!(*label, redact(UNINDEXED_MINT));
}

#[tokio::test]
async fn solanart_sale_price_and_report_line() {
    let event = classifier(Marketplace::Solanart, COOL_CAT_7)
        .classify(&load_transaction("solanart_sale.json"))
        .await;

    assert_eq!(
        event.kind,
        TradeKind::Sold {
            buyer: address(BUYER),
            seller: address(SELLER),
            mint: address(COOL_CAT_7),
            label: "Cool Cat #7".to_string(),
            price: Lamports(1_050_000_000),
        }
    );
    assert_eq!(
        ReportLine(&event).to_string(),
        format!(
            "[Solanart] SOLD → 7dHbW...Y7ARj BOUGHT Cool Cat #7 FROM EPjFW...TDt1v FOR 1.05 SOL → https://solscan.io/tx/{}",
            event.signature
        )
    );
}

#[tokio::test]
async fn digital_eyes_listing_carries_markup() {
    let event = classifier(Marketplace::DigitalEyes, COOL_CAT_7)
        .classify(&load_transaction("digital_eyes_listing.json"))
        .await;

    assert_eq!(
        event.kind,
        TradeKind::Listed {
            seller: address(SELLER),
            mint: address(COOL_CAT_7),
            label: "Cool Cat #7".to_string(),
            price: Lamports(2_106_000_000),
        }
    );
}

#[tokio::test]
async fn same_tree_under_another_schema_is_unrecognized() {
    // a Solanart listing needs five inner instructions under #3
    let event = classifier(Marketplace::Solanart, COOL_CAT_7)
        .classify(&load_transaction("digital_eyes_listing.json"))
        .await;

    assert!(matches!(event.kind, TradeKind::Unrecognized { .. }));
    assert_eq!(event.marketplace, Marketplace::Solanart);
}
