use crate::instruction::{InstructionNode, fields};
use crate::marketplaces::{
    Candidate, Marketplace, MarketplaceSchema, address_field, inner, inner_count, sum_amounts,
    top_level,
};

/// Listing prices are shown with the buyer-side fee included.
pub const LISTING_MARKUP_PER_MILLE: u64 = 1053;

pub struct DigitalEyesSchema;

impl MarketplaceSchema for DigitalEyesSchema {
    fn marketplace(&self) -> Marketplace {
        Marketplace::DigitalEyes
    }

    fn is_sale(&self, top: &[InstructionNode]) -> bool {
        top.len() == 2 && inner_count(top, 0) == Some(4)
    }

    /// Buyer pays out of #1.inner[0]; the seller's cut lands via #1.inner[2].
    /// The price is every amount moved by #1.
    fn sale(&self, top: &[InstructionNode]) -> Result<Candidate, String> {
        let settlement = top_level(top, 1)?;
        Ok(Candidate::Sale {
            buyer: address_field(inner(top, 1, 0)?, fields::FROM_ACCOUNT)?,
            seller: address_field(inner(top, 1, 2)?, fields::TO_ACCOUNT)?,
            mint: address_field(inner(top, 0, 3)?, fields::MINT)?,
            price: sum_amounts(
                settlement
                    .children
                    .iter()
                    .filter_map(|node| node.number(fields::AMOUNT)),
            )?,
        })
    }

    fn is_listing(&self, top: &[InstructionNode]) -> bool {
        top.len() == 5 && inner_count(top, 4) == Some(2)
    }

    fn listing_markup_per_mille(&self) -> Option<u64> {
        Some(LISTING_MARKUP_PER_MILLE)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, clippy::panic, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::marketplaces::DIGITAL_EYES_PROGRAM_ID;
    use crate::marketplaces::fixtures::*;
    use crate::price::Lamports;

    fn sale_tree() -> Vec<InstructionNode> {
        let mut setup = filler(3);
        setup.push(initialize_account(key(60), key(3)));
        vec![
            opaque(DIGITAL_EYES_PROGRAM_ID, vec![1], setup),
            opaque(
                DIGITAL_EYES_PROGRAM_ID,
                vec![1],
                vec![
                    system_transfer(key(1), key(77), 1_000_000_000),
                    system_transfer(key(77), key(88), 25_000_000),
                    system_transfer(key(77), key(2), 25_000_000),
                ],
            ),
        ]
    }

    #[test]
    fn sale_sums_every_settlement_amount() {
        assert_eq!(
            DigitalEyesSchema.match_shape(&sale_tree()).unwrap(),
            Candidate::Sale {
                buyer: key(1),
                seller: key(2),
                mint: key(3),
                price: Lamports(1_050_000_000),
            }
        );
    }

    #[test]
    fn sale_ignores_nodes_without_amount() {
        let mut top = sale_tree();
        top[1].children.push(token_transfer(key(60), key(61)));
        top[1].children[3].fields.retain(|(name, _)| *name != fields::AMOUNT);
        assert!(matches!(
            DigitalEyesSchema.match_shape(&top).unwrap(),
            Candidate::Sale { price, .. } if price == Lamports(1_050_000_000)
        ));
    }

    #[test]
    fn listing_applies_markup() {
        let top = listing(DIGITAL_EYES_PROGRAM_ID, key(4), key(5), 2_000_000_000, [0, 0, 0, 0, 2]);
        let Candidate::Listing { price, .. } = DigitalEyesSchema.match_shape(&top).unwrap() else {
            panic!("expected a listing");
        };
        assert_eq!(price, Lamports(2_106_000_000));
        assert_eq!(price.display_sol(), "2.11");
    }
}
