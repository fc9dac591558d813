//! JSON-RPC 2.0 client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use solana_pubkey::Pubkey;

use crate::error::Error;
use crate::ledger::LedgerRpc;
use crate::types::{CompiledInstruction, InnerInstructionSet, RawTransaction, Signature};

const COMMITMENT: &str = "confirmed";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpRpc {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpRpc {
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>, Error> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        let body = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let response: RpcResponse<T> = serde_json::from_slice(&body)?;

        if let Some(error) = response.error {
            return Err(Error::Transport {
                reason: format!("{method} failed with {}: {}", error.code, error.message),
            });
        }
        Ok(response.result)
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct SignatureInfo {
    signature: String,
}

#[derive(Deserialize)]
struct AccountEnvelope {
    value: Option<AccountValue>,
}

#[derive(Deserialize)]
struct AccountValue {
    /// `[payload, encoding]`
    data: (String, String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionEnvelope {
    #[serde(default)]
    slot: u64,
    block_time: Option<i64>,
    meta: Option<TransactionMeta>,
    transaction: TransactionBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionMeta {
    err: Option<Value>,
    #[serde(default)]
    log_messages: Option<Vec<String>>,
    #[serde(default)]
    inner_instructions: Option<Vec<WireInnerInstructions>>,
    #[serde(default)]
    loaded_addresses: Option<LoadedAddresses>,
}

#[derive(Deserialize, Default)]
struct LoadedAddresses {
    #[serde(default)]
    writable: Vec<String>,
    #[serde(default)]
    readonly: Vec<String>,
}

#[derive(Deserialize)]
struct WireInnerInstructions {
    index: u8,
    instructions: Vec<WireInstruction>,
}

#[derive(Deserialize)]
struct TransactionBody {
    signatures: Vec<String>,
    message: WireMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    account_keys: Vec<String>,
    instructions: Vec<WireInstruction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInstruction {
    program_id_index: u8,
    accounts: Vec<u8>,
    data: String,
}

impl From<WireInstruction> for CompiledInstruction {
    fn from(ix: WireInstruction) -> Self {
        Self {
            program_id_index: ix.program_id_index,
            accounts: ix.accounts,
            data: ix.data,
        }
    }
}

impl TransactionEnvelope {
    fn into_raw(self, requested: &str) -> RawTransaction {
        let meta = self.meta;
        let failed = meta.as_ref().is_some_and(|m| m.err.as_ref().is_some_and(|err| !err.is_null()));
        let (log_messages, inner, loaded) = match meta {
            Some(m) => (
                m.log_messages.unwrap_or_default(),
                m.inner_instructions.unwrap_or_default(),
                m.loaded_addresses.unwrap_or_default(),
            ),
            None => (Vec::new(), Vec::new(), LoadedAddresses::default()),
        };

        // Versioned messages index loaded writable then readonly addresses
        // after the static keys.
        let mut account_keys = self.transaction.message.account_keys;
        account_keys.extend(loaded.writable);
        account_keys.extend(loaded.readonly);

        RawTransaction {
            signature: self
                .transaction
                .signatures
                .into_iter()
                .next()
                .unwrap_or_else(|| requested.to_string()),
            slot: self.slot,
            block_time: self.block_time,
            failed,
            log_messages,
            account_keys,
            instructions: self
                .transaction
                .message
                .instructions
                .into_iter()
                .map(CompiledInstruction::from)
                .collect(),
            inner_instructions: inner
                .into_iter()
                .map(|set| InnerInstructionSet {
                    index: set.index,
                    instructions: set.instructions.into_iter().map(CompiledInstruction::from).collect(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LedgerRpc for HttpRpc {
    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        until: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Signature>, Error> {
        let mut options = json!({ "commitment": COMMITMENT });
        if let Some(until) = until {
            options["until"] = json!(until);
        }
        if let Some(limit) = limit {
            options["limit"] = json!(limit);
        }
        let infos: Option<Vec<SignatureInfo>> = self
            .call("getSignaturesForAddress", json!([address.to_string(), options]))
            .await?;
        Ok(infos
            .unwrap_or_default()
            .into_iter()
            .map(|info| info.signature)
            .collect())
    }

    async fn transaction(&self, signature: &str) -> Result<Option<RawTransaction>, Error> {
        let envelope: Option<TransactionEnvelope> = self
            .call(
                "getTransaction",
                json!([
                    signature,
                    {
                        "encoding": "json",
                        "commitment": COMMITMENT,
                        "maxSupportedTransactionVersion": 0,
                    }
                ]),
            )
            .await?;
        Ok(envelope.map(|envelope| envelope.into_raw(signature)))
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, Error> {
        let envelope: Option<AccountEnvelope> = self
            .call(
                "getAccountInfo",
                json!([address.to_string(), { "encoding": "base64", "commitment": COMMITMENT }]),
            )
            .await?;
        let Some(value) = envelope.and_then(|envelope| envelope.value) else {
            return Ok(None);
        };
        let (payload, _encoding) = value.data;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map(Some)
            .map_err(|e| Error::MalformedAccountData {
                reason: format!("account {address} is not base64: {e}"),
            })
    }
}
