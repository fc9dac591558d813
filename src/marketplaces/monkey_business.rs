use crate::instruction::{InstructionNode, fields};
use crate::marketplaces::{
    Candidate, Marketplace, MarketplaceSchema, address_field, amount_field, inner, inner_count,
    sum_amounts,
};

pub struct MonkeyBusinessSchema;

impl MarketplaceSchema for MonkeyBusinessSchema {
    fn marketplace(&self) -> Marketplace {
        Marketplace::MonkeyBusiness
    }

    fn is_sale(&self, top: &[InstructionNode]) -> bool {
        top.len() == 2 && inner_count(top, 1) == Some(4)
    }

    fn sale(&self, top: &[InstructionNode]) -> Result<Candidate, String> {
        let payment = inner(top, 1, 0)?;
        let fee = inner(top, 1, 1)?;
        Ok(Candidate::Sale {
            buyer: address_field(payment, fields::FROM_ACCOUNT)?,
            seller: address_field(payment, fields::TO_ACCOUNT)?,
            mint: address_field(inner(top, 0, 3)?, fields::MINT)?,
            price: sum_amounts([amount_field(payment)?, amount_field(fee)?])?,
        })
    }

    fn is_listing(&self, top: &[InstructionNode]) -> bool {
        top.len() == 5 && inner_count(top, 4) == Some(2)
    }
}
