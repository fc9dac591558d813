use crate::instruction::{InstructionNode, fields};
use crate::marketplaces::{
    Candidate, Marketplace, MarketplaceSchema, address_field, amount_field, inner, inner_count,
    sum_amounts,
};

/// Solanart escrow program.
///
/// A sale is two top-level instructions where #0 invokes four inner
/// instructions. Some sales arrive bundled with the listing setup as five
/// top-level instructions; those are told apart from a listing by the inner
/// count of #3.
pub struct SolanartSchema;

impl MarketplaceSchema for SolanartSchema {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Solanart
    }

    fn is_sale(&self, top: &[InstructionNode]) -> bool {
        if inner_count(top, 0) != Some(4) {
            return false;
        }
        match top.len() {
            2 => true,
            5 => inner_count(top, 3) != Some(5),
            _ => false,
        }
    }

    fn sale(&self, top: &[InstructionNode]) -> Result<Candidate, String> {
        let fee = inner(top, 1, 0)?;
        let payment = inner(top, 1, 1)?;
        Ok(Candidate::Sale {
            buyer: address_field(payment, fields::FROM_ACCOUNT)?,
            seller: address_field(payment, fields::TO_ACCOUNT)?,
            mint: address_field(inner(top, 0, 3)?, fields::MINT)?,
            price: sum_amounts([amount_field(fee)?, amount_field(payment)?])?,
        })
    }

    fn is_listing(&self, top: &[InstructionNode]) -> bool {
        top.len() == 5 && inner_count(top, 3) == Some(5)
    }
}
