//! 32-byte address fields and program-derived address search.

use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use solana_pubkey::Pubkey;

use crate::error::Error;

pub const ADDRESS_LEN: usize = 32;
pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

pub fn decode_address(bytes: &[u8], offset: usize) -> Result<Pubkey, Error> {
    let slice = offset
        .checked_add(ADDRESS_LEN)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| Error::MalformedAccountData {
            reason: format!(
                "address at offset {offset} needs {ADDRESS_LEN} bytes, buffer has {}",
                bytes.len()
            ),
        })?;
    let mut raw = [0u8; ADDRESS_LEN];
    raw.copy_from_slice(slice);
    Ok(Pubkey::new_from_array(raw))
}

pub fn encode_address(address: &Pubkey) -> [u8; ADDRESS_LEN] {
    address.to_bytes()
}

pub fn parse_address(value: &str) -> Result<Pubkey, Error> {
    Pubkey::from_str(value).map_err(|e| Error::InvalidAddress {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `bytes` is the compressed form of a point on the ed25519 curve.
pub fn is_on_curve(bytes: &[u8; ADDRESS_LEN]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Canonical program-derived address for `seeds` under `program_id`, with the
/// bump that produced it.
pub fn find_program_derived_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), Error> {
    find_program_derived_address_with(seeds, program_id, is_on_curve)
}

/// Bump search with a caller-supplied curve membership test. Bumps are tried
/// from 255 down to 0 and the first off-curve digest wins.
pub fn find_program_derived_address_with<F>(
    seeds: &[&[u8]],
    program_id: &Pubkey,
    is_on_curve: F,
) -> Result<(Pubkey, u8), Error>
where
    F: Fn(&[u8; ADDRESS_LEN]) -> bool,
{
    validate_seeds(seeds)?;
    for bump in (0..=u8::MAX).rev() {
        let digest = derive_digest(seeds, bump, program_id);
        if !is_on_curve(&digest) {
            return Ok((Pubkey::new_from_array(digest), bump));
        }
    }
    Err(Error::NoValidAddress)
}

fn validate_seeds(seeds: &[&[u8]]) -> Result<(), Error> {
    // the bump occupies the last seed slot
    if seeds.len() >= MAX_SEEDS {
        return Err(Error::InvalidSeeds {
            reason: format!("{} seeds given, at most {} allowed", seeds.len(), MAX_SEEDS - 1),
        });
    }
    if let Some((i, seed)) = seeds.iter().enumerate().find(|(_, s)| s.len() > MAX_SEED_LEN) {
        return Err(Error::InvalidSeeds {
            reason: format!("seed {i} is {} bytes, max {MAX_SEED_LEN}", seed.len()),
        });
    }
    Ok(())
}

fn derive_digest(seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> [u8; ADDRESS_LEN] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let hash = hasher.finalize();

    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(&hash);
    out
}

/// Redacted display form: first and last five characters.
pub fn redact(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return value.to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{head}...{tail}")
}
