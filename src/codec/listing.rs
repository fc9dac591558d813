use crate::codec::read_u64;
use crate::error::Error;

/// Offset of the price inside a marketplace listing payload. All supported
/// schemas put a one-byte tag first.
pub const LISTING_PRICE_OFFSET: usize = 1;

/// Listing price in lamports.
pub fn price_from_listing_payload(payload: &[u8]) -> Result<u64, Error> {
    read_u64(payload, LISTING_PRICE_OFFSET, "listing price")
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn price_follows_tag_byte() {
        let mut payload = vec![0x04];
        payload.extend_from_slice(&2_500_000_000u64.to_le_bytes());
        payload.push(0xfe);
        assert_eq!(price_from_listing_payload(&payload).unwrap(), 2_500_000_000);
    }

    #[test]
    fn short_payload_is_truncation() {
        assert!(matches!(
            price_from_listing_payload(&[0x04, 1, 2, 3]),
            Err(Error::TruncatedAccountData { .. })
        ));
    }
}
