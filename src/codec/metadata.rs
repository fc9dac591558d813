//! Metaplex token-metadata account layout.

use solana_pubkey::Pubkey;

use crate::codec::address::{decode_address, find_program_derived_address, parse_address};
use crate::codec::{read_array, read_u16, read_u32};
use crate::error::Error;

pub const METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";
pub const METADATA_SEED: &[u8] = b"metadata";

const KEY_OFFSET: usize = 0;
const UPDATE_AUTHORITY_OFFSET: usize = 1;
const MINT_OFFSET: usize = 33;
const DATA_OFFSET: usize = 65;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataAccountRecord {
    pub key: u8,
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
}

impl MetadataAccountRecord {
    /// Numeric collection id embedded in the name, e.g. `412` for
    /// `"Degen Ape #412"` with separator `"#"`. Anything after the first
    /// space following the id is ignored.
    pub fn collection_id(&self, separator: &str) -> Option<u32> {
        let (_, rest) = self.name.split_once(separator)?;
        rest.trim_start().split(' ').next()?.parse().ok()
    }
}

pub fn decode_metadata_account(bytes: &[u8]) -> Result<MetadataAccountRecord, Error> {
    let [key] = read_array::<1>(bytes, KEY_OFFSET, "edition key")?;
    let update_authority = decode_address(bytes, UPDATE_AUTHORITY_OFFSET)?;
    let mint = decode_address(bytes, MINT_OFFSET)?;

    let mut offset = DATA_OFFSET;
    let name = read_string(bytes, &mut offset, "name")?;
    let symbol = read_string(bytes, &mut offset, "symbol")?;
    let uri = read_string(bytes, &mut offset, "uri")?;
    let seller_fee_basis_points = read_u16(bytes, offset, "seller fee basis points")?;

    Ok(MetadataAccountRecord {
        key,
        update_authority,
        mint,
        name,
        symbol,
        uri,
        seller_fee_basis_points,
    })
}

/// Length-prefixed (u32 LE) UTF-8 string; trailing NUL padding is dropped.
fn read_string(bytes: &[u8], offset: &mut usize, field: &str) -> Result<String, Error> {
    let len = read_u32(bytes, *offset, field)? as usize;
    let start = *offset + 4;
    let raw = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| Error::TruncatedAccountData {
            reason: format!(
                "{field} declares {len} bytes at offset {start}, buffer has {}",
                bytes.len()
            ),
        })?;
    let value = std::str::from_utf8(raw).map_err(|e| Error::MalformedAccountData {
        reason: format!("{field} is not valid utf-8: {e}"),
    })?;
    *offset = start + len;
    Ok(value.trim_end_matches('\0').to_string())
}

/// Address of the metadata account for `mint`.
pub fn metadata_address(mint: &Pubkey) -> Result<Pubkey, Error> {
    let program_id = parse_address(METADATA_PROGRAM_ID)?;
    let seeds: [&[u8]; 3] = [METADATA_SEED, program_id.as_ref(), mint.as_ref()];
    find_program_derived_address(&seeds, &program_id).map(|(address, _)| address)
}
