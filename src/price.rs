use std::fmt;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// An amount in the ledger's smallest native unit. Kept exact until display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Lamports(pub u64);

impl Lamports {
    /// Sum of `amounts`, `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        amounts
            .into_iter()
            .try_fold(0u64, |acc, amount| acc.checked_add(amount))
            .map(Self)
    }

    /// Scale by `per_mille / 1000`, truncating to whole lamports.
    pub fn with_markup(self, per_mille: u64) -> Self {
        let scaled = u128::from(self.0) * u128::from(per_mille) / 1000;
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }

    /// Display units rounded half-up to two decimals, e.g. `"1.05"`.
    pub fn display_sol(self) -> String {
        let cents_divisor = u128::from(LAMPORTS_PER_SOL / 100);
        let cents = (u128::from(self.0) + cents_divisor / 2) / cents_divisor;
        format!("{}.{:02}", cents / 100, cents % 100)
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.display_sol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_amount_plus_fee_displays_two_decimals() {
        let price = Lamports::checked_sum([1_000_000_000, 50_000_000]);
        assert_eq!(price, Some(Lamports(1_050_000_000)));
        assert_eq!(price.map(Lamports::display_sol).as_deref(), Some("1.05"));
    }

    #[test]
    fn rounding_happens_after_summation() {
        // each part alone rounds down to 0.00, the total rounds to 0.01
        let parts = [4_000_000, 4_000_000];
        let total = Lamports::checked_sum(parts).map(Lamports::display_sol);
        assert_eq!(total.as_deref(), Some("0.01"));
        assert_eq!(Lamports(parts[0]).display_sol(), "0.00");
    }

    #[test]
    fn display_rounds_half_up() {
        assert_eq!(Lamports(0).display_sol(), "0.00");
        assert_eq!(Lamports(4_999_999).display_sol(), "0.00");
        assert_eq!(Lamports(5_000_000).display_sol(), "0.01");
        assert_eq!(Lamports(12_345_678_901).display_sol(), "12.35");
        assert_eq!(Lamports(u64::MAX).display_sol(), "18446744073.71");
    }

    #[test]
    fn overflowing_sum_is_none() {
        assert_eq!(Lamports::checked_sum([u64::MAX, 1]), None);
    }

    #[test]
    fn markup_scales_exactly() {
        assert_eq!(Lamports(1_000_000_000).with_markup(1053), Lamports(1_053_000_000));
        assert_eq!(Lamports(2_000_000_000).with_markup(1053).display_sol(), "2.11");
        assert_eq!(Lamports(u64::MAX).with_markup(2000), Lamports(u64::MAX));
    }

    #[test]
    fn display_appends_unit() {
        assert_eq!(Lamports(1_500_000_000).to_string(), "1.50 SOL");
    }
}
