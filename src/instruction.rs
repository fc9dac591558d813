//! Instruction tree decoding.
//!
//! System and SPL Token instructions are decoded into named fields; every
//! other program is kept as its raw payload under [`fields::DATA`].

use solana_pubkey::Pubkey;

use crate::codec::address::{decode_address, parse_address};
use crate::codec::{read_array, read_u32, read_u64};
use crate::error::Error;
use crate::types::{CompiledInstruction, RawTransaction};

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

pub mod fields {
    pub const ACCOUNT: &str = "Account";
    pub const AMOUNT: &str = "Amount";
    pub const AUTHORITY: &str = "Authority";
    pub const AUTHORITY_TYPE: &str = "Authority Type";
    pub const CURRENT_AUTHORITY: &str = "Current Authority";
    pub const DATA: &str = "Data";
    pub const DECIMALS: &str = "Decimals";
    pub const DELEGATE: &str = "Delegate";
    pub const DESTINATION: &str = "Destination";
    pub const FROM_ACCOUNT: &str = "From Account";
    pub const MINT: &str = "Mint";
    pub const MINT_AUTHORITY: &str = "Mint Authority";
    pub const NEW_ACCOUNT: &str = "New Account";
    pub const NEW_AUTHORITY: &str = "New Authority";
    pub const OWNER_ACCOUNT: &str = "Owner Account";
    pub const PROGRAM_ID: &str = "Program Id";
    pub const SOURCE: &str = "Source";
    pub const SPACE: &str = "Space";
    pub const TO_ACCOUNT: &str = "To Account";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Address(Pubkey),
    Number(u64),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionNode {
    pub program_id: Pubkey,
    pub name: &'static str,
    pub fields: Vec<(&'static str, FieldValue)>,
    pub children: Vec<InstructionNode>,
}

impl InstructionNode {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    pub fn address(&self, field: &str) -> Option<Pubkey> {
        match self.get(field)? {
            FieldValue::Address(address) => Some(*address),
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> Option<u64> {
        match self.get(field)? {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn bytes(&self, field: &str) -> Option<&[u8]> {
        match self.get(field)? {
            FieldValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn child(&self, index: usize) -> Option<&InstructionNode> {
        self.children.get(index)
    }
}

/// Decode the top-level instructions of `tx`, each owning its inner
/// instructions.
pub fn decode_transaction(tx: &RawTransaction) -> Result<Vec<InstructionNode>, Error> {
    let keys = tx
        .account_keys
        .iter()
        .map(|key| parse_address(key))
        .collect::<Result<Vec<_>, _>>()?;

    let mut nodes = Vec::with_capacity(tx.instructions.len());
    for (position, ix) in tx.instructions.iter().enumerate() {
        let mut node = decode_instruction(ix, &tx.account_keys, &keys)?;
        for set in tx
            .inner_instructions
            .iter()
            .filter(|set| usize::from(set.index) == position)
        {
            for inner in &set.instructions {
                node.children.push(decode_instruction(inner, &tx.account_keys, &keys)?);
            }
        }
        nodes.push(node);
    }
    Ok(nodes)
}

fn decode_instruction(
    ix: &CompiledInstruction,
    raw_keys: &[String],
    keys: &[Pubkey],
) -> Result<InstructionNode, Error> {
    let program_index = usize::from(ix.program_id_index);
    let (Some(program_key), Some(program_id)) =
        (raw_keys.get(program_index), keys.get(program_index))
    else {
        return Err(Error::MalformedInstruction {
            reason: format!(
                "program index {program_index} out of range for {} keys",
                keys.len()
            ),
        });
    };

    let data = bs58::decode(&ix.data)
        .into_vec()
        .map_err(|e| Error::MalformedInstruction {
            reason: format!("instruction data is not base58: {e}"),
        })?;
    let accounts = ix
        .accounts
        .iter()
        .map(|&i| {
            keys.get(usize::from(i))
                .copied()
                .ok_or_else(|| Error::MalformedInstruction {
                    reason: format!("account index {i} out of range for {} keys", keys.len()),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let decoded = match program_key.as_str() {
        SYSTEM_PROGRAM_ID => decode_system(&data, &accounts),
        TOKEN_PROGRAM_ID => decode_token(&data, &accounts),
        _ => None,
    };
    let (name, fields) =
        decoded.unwrap_or_else(|| ("Unknown", vec![(fields::DATA, FieldValue::Bytes(data))]));

    Ok(InstructionNode {
        program_id: *program_id,
        name,
        fields,
        children: Vec::new(),
    })
}

type Decoded = (&'static str, Vec<(&'static str, FieldValue)>);

fn addr(accounts: &[Pubkey], index: usize) -> Option<FieldValue> {
    accounts.get(index).copied().map(FieldValue::Address)
}

fn u64_at(data: &[u8], offset: usize) -> Option<FieldValue> {
    read_u64(data, offset, "u64").ok().map(FieldValue::Number)
}

fn u8_at(data: &[u8], offset: usize) -> Option<FieldValue> {
    read_array::<1>(data, offset, "u8")
        .ok()
        .map(|[b]| FieldValue::Number(u64::from(b)))
}

fn decode_system(data: &[u8], accounts: &[Pubkey]) -> Option<Decoded> {
    use fields::*;

    let tag = read_u32(data, 0, "system instruction tag").ok()?;
    match tag {
        0 => Some((
            "CreateAccount",
            vec![
                (OWNER_ACCOUNT, addr(accounts, 0)?),
                (NEW_ACCOUNT, addr(accounts, 1)?),
                (AMOUNT, u64_at(data, 4)?),
                (SPACE, u64_at(data, 12)?),
                (PROGRAM_ID, FieldValue::Address(decode_address(data, 20).ok()?)),
            ],
        )),
        1 => Some((
            "Assign",
            vec![
                (ACCOUNT, addr(accounts, 0)?),
                (PROGRAM_ID, FieldValue::Address(decode_address(data, 4).ok()?)),
            ],
        )),
        2 => Some((
            "Transfer",
            vec![
                (FROM_ACCOUNT, addr(accounts, 0)?),
                (TO_ACCOUNT, addr(accounts, 1)?),
                (AMOUNT, u64_at(data, 4)?),
            ],
        )),
        8 => Some((
            "Allocate",
            vec![(ACCOUNT, addr(accounts, 0)?), (SPACE, u64_at(data, 4)?)],
        )),
        _ => None,
    }
}

fn decode_token(data: &[u8], accounts: &[Pubkey]) -> Option<Decoded> {
    use fields::*;

    let [tag] = read_array::<1>(data, 0, "token instruction tag").ok()?;
    match tag {
        0 => Some((
            "InitializeMint",
            vec![
                (ACCOUNT, addr(accounts, 0)?),
                (DECIMALS, u8_at(data, 1)?),
                (MINT_AUTHORITY, FieldValue::Address(decode_address(data, 2).ok()?)),
            ],
        )),
        1 => Some((
            "InitializeAccount",
            vec![
                (ACCOUNT, addr(accounts, 0)?),
                (MINT, addr(accounts, 1)?),
                (AUTHORITY, addr(accounts, 2)?),
            ],
        )),
        3 => Some((
            "Transfer",
            vec![
                (SOURCE, addr(accounts, 0)?),
                (DESTINATION, addr(accounts, 1)?),
                (AUTHORITY, addr(accounts, 2)?),
                (AMOUNT, u64_at(data, 1)?),
            ],
        )),
        4 => Some((
            "Approve",
            vec![
                (SOURCE, addr(accounts, 0)?),
                (DELEGATE, addr(accounts, 1)?),
                (AUTHORITY, addr(accounts, 2)?),
                (AMOUNT, u64_at(data, 1)?),
            ],
        )),
        5 => Some((
            "Revoke",
            vec![(SOURCE, addr(accounts, 0)?), (AUTHORITY, addr(accounts, 1)?)],
        )),
        6 => {
            let mut decoded = vec![
                (ACCOUNT, addr(accounts, 0)?),
                (CURRENT_AUTHORITY, addr(accounts, 1)?),
                (AUTHORITY_TYPE, u8_at(data, 1)?),
            ];
            if let Some(FieldValue::Number(1)) = u8_at(data, 2) {
                decoded.push((NEW_AUTHORITY, FieldValue::Address(decode_address(data, 3).ok()?)));
            }
            Some(("SetAuthority", decoded))
        }
        7 => Some((
            "MintTo",
            vec![
                (MINT, addr(accounts, 0)?),
                (DESTINATION, addr(accounts, 1)?),
                (AUTHORITY, addr(accounts, 2)?),
                (AMOUNT, u64_at(data, 1)?),
            ],
        )),
        9 => Some((
            "CloseAccount",
            vec![
                (ACCOUNT, addr(accounts, 0)?),
                (DESTINATION, addr(accounts, 1)?),
                (AUTHORITY, addr(accounts, 2)?),
            ],
        )),
        12 => Some((
            "TransferChecked",
            vec![
                (SOURCE, addr(accounts, 0)?),
                (MINT, addr(accounts, 1)?),
                (DESTINATION, addr(accounts, 2)?),
                (AUTHORITY, addr(accounts, 3)?),
                (AMOUNT, u64_at(data, 1)?),
                (DECIMALS, u8_at(data, 9)?),
            ],
        )),
        _ => None,
    }
}
