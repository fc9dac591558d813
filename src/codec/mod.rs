pub mod address;
pub mod listing;
pub mod metadata;
pub mod token;

use crate::error::Error;

/// Read a little-endian `u64` at `offset`.
pub(crate) fn read_u64(bytes: &[u8], offset: usize, what: &str) -> Result<u64, Error> {
    let raw = read_array::<8>(bytes, offset, what)?;
    Ok(u64::from_le_bytes(raw))
}

/// Read a little-endian `u32` at `offset`.
pub(crate) fn read_u32(bytes: &[u8], offset: usize, what: &str) -> Result<u32, Error> {
    let raw = read_array::<4>(bytes, offset, what)?;
    Ok(u32::from_le_bytes(raw))
}

/// Read a little-endian `u16` at `offset`.
pub(crate) fn read_u16(bytes: &[u8], offset: usize, what: &str) -> Result<u16, Error> {
    let raw = read_array::<2>(bytes, offset, what)?;
    Ok(u16::from_le_bytes(raw))
}

pub(crate) fn read_array<const N: usize>(
    bytes: &[u8],
    offset: usize,
    what: &str,
) -> Result<[u8; N], Error> {
    let slice = offset
        .checked_add(N)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| Error::TruncatedAccountData {
            reason: format!(
                "{what} at offset {offset} needs {N} bytes, buffer has {}",
                bytes.len()
            ),
        })?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}
