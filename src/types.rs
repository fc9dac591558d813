/// Base58 transaction signature as reported by the ledger.
pub type Signature = String;

/// A compiled instruction as it appears in a transaction message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CompiledInstruction {
    /// Index of the invoked program in the transaction's account keys.
    pub program_id_index: u8,
    /// Indices of the instruction's accounts in the transaction's account keys.
    pub accounts: Vec<u8>,
    /// Base58-encoded instruction payload.
    pub data: String,
}

/// Instructions invoked by the program of one top-level instruction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct InnerInstructionSet {
    /// Position of the parent instruction in the message.
    pub index: u8,
    /// Invoked instructions, in execution order.
    pub instructions: Vec<CompiledInstruction>,
}

/// A confirmed transaction together with its execution metadata.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RawTransaction {
    /// First signature of the transaction (base58).
    pub signature: Signature,
    /// Slot in which the transaction landed.
    #[serde(default)]
    pub slot: u64,
    /// Unix timestamp of the block, when the node knows it.
    pub block_time: Option<i64>,
    /// `true` when the ledger reported an execution error (`meta.err`).
    #[serde(default)]
    pub failed: bool,
    /// Program log lines.
    #[serde(default)]
    pub log_messages: Vec<String>,
    /// Static account keys followed by any loaded (lookup table) addresses.
    pub account_keys: Vec<String>,
    /// Top-level instructions.
    pub instructions: Vec<CompiledInstruction>,
    /// Inner instructions grouped by parent position.
    #[serde(default)]
    pub inner_instructions: Vec<InnerInstructionSet>,
}

impl RawTransaction {
    /// Whether execution failed, either by the error flag or a log line
    /// reporting the failure.
    pub fn execution_failed(&self) -> bool {
        self.failed || self.log_messages.iter().any(|line| line.contains("failed"))
    }

    /// Age of the transaction in seconds relative to `now` (unix seconds).
    /// `None` while the block time is unknown.
    pub fn age_secs(&self, now: i64) -> Option<i64> {
        self.block_time.map(|block_time| now.saturating_sub(block_time))
    }
}
