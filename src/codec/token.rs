use solana_pubkey::Pubkey;

use crate::codec::address::decode_address;
use crate::error::Error;

const MINT_OFFSET: usize = 0;
const OWNER_OFFSET: usize = 32;

/// Mint and owner of an SPL token account. No other fields are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
}

pub fn decode_token_account(bytes: &[u8]) -> Result<TokenAccount, Error> {
    Ok(TokenAccount {
        mint: decode_address(bytes, MINT_OFFSET)?,
        owner: decode_address(bytes, OWNER_OFFSET)?,
    })
}
