pub mod digital_eyes;
pub mod monkey_business;
pub mod solanart;

use solana_pubkey::Pubkey;
use strum::IntoEnumIterator;

use crate::codec::listing::price_from_listing_payload;
use crate::error::Error;
use crate::instruction::{InstructionNode, fields};
use crate::marketplaces::digital_eyes::DigitalEyesSchema;
use crate::marketplaces::monkey_business::MonkeyBusinessSchema;
use crate::marketplaces::solanart::SolanartSchema;
use crate::price::Lamports;

pub const SOLANART_PROGRAM_ID: &str = "CJsLwbP1iu5DuUikHEJnLfANgKy6stB2uFgvBBHoyxwz";
pub const MONKEY_BUSINESS_PROGRAM_ID: &str = "GvQVaDNLV7zAPNx35FqWmgwuxa4B2h5tuuL73heqSf1C";
pub const DIGITAL_EYES_PROGRAM_ID: &str = "A7p8451ktDCHq5yYaHczeLMYsjRsAkzc3hCXcSrwYHU7";

const SOLANART_ADDRESS: Pubkey = Pubkey::from_str_const(SOLANART_PROGRAM_ID);
const MONKEY_BUSINESS_ADDRESS: Pubkey = Pubkey::from_str_const(MONKEY_BUSINESS_PROGRAM_ID);
const DIGITAL_EYES_ADDRESS: Pubkey = Pubkey::from_str_const(DIGITAL_EYES_PROGRAM_ID);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum Marketplace {
    #[strum(serialize = "Solanart")]
    Solanart,
    #[strum(serialize = "Solana Monkey Business")]
    MonkeyBusiness,
    #[strum(serialize = "Digital Eyes")]
    DigitalEyes,
}

impl Marketplace {
    /// Resolve a configured name, either the short key (`"digital_eyes"`) or
    /// the display name (`"Digital Eyes"`), ignoring case.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        let wanted = name.trim();
        Self::iter()
            .find(|m| {
                m.as_str().eq_ignore_ascii_case(wanted) || m.to_string().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| Error::UnknownMarketplace {
                name: name.to_string(),
            })
    }

    pub fn program_id(self) -> Pubkey {
        match self {
            Self::Solanart => SOLANART_ADDRESS,
            Self::MonkeyBusiness => MONKEY_BUSINESS_ADDRESS,
            Self::DigitalEyes => DIGITAL_EYES_ADDRESS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solanart => "solanart",
            Self::MonkeyBusiness => "monkey_business",
            Self::DigitalEyes => "digital_eyes",
        }
    }

    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }
}

/// What a transaction looks like before any account lookups or enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Delisting {
        token_account: Pubkey,
    },
    Sale {
        buyer: Pubkey,
        seller: Pubkey,
        mint: Pubkey,
        price: Lamports,
    },
    Listing {
        seller: Pubkey,
        mint: Pubkey,
        price: Lamports,
    },
}

/// Shape constants and field coordinates of one marketplace program.
///
/// Every schema shares the delisting and listing layouts; they differ in
/// which instruction carries the inner-instruction count that identifies a
/// sale or listing, where sale amounts live, and whether the listing price
/// carries a markup.
pub trait MarketplaceSchema: Sync {
    fn marketplace(&self) -> Marketplace;

    fn is_sale(&self, top: &[InstructionNode]) -> bool;

    fn sale(&self, top: &[InstructionNode]) -> Result<Candidate, String>;

    fn is_listing(&self, top: &[InstructionNode]) -> bool;

    /// Listing price multiplier in thousandths.
    fn listing_markup_per_mille(&self) -> Option<u64> {
        None
    }

    fn is_delisting(&self, top: &[InstructionNode]) -> bool {
        top.len() == 1 && inner_count(top, 0) == Some(2)
    }

    fn delisting(&self, top: &[InstructionNode]) -> Result<Candidate, String> {
        let transfer = inner(top, 0, 0)?;
        Ok(Candidate::Delisting {
            token_account: address_field(transfer, fields::DESTINATION)?,
        })
    }

    fn listing(&self, top: &[InstructionNode]) -> Result<Candidate, String> {
        let seller = address_field(top_level(top, 0)?, fields::OWNER_ACCOUNT)?;
        let mint = address_field(top_level(top, 1)?, fields::MINT)?;
        let payload = top_level(top, 4)?
            .bytes(fields::DATA)
            .ok_or_else(|| "listing instruction carries no payload".to_string())?;
        let price = Lamports(price_from_listing_payload(payload).map_err(|e| e.to_string())?);
        let price = match self.listing_markup_per_mille() {
            Some(per_mille) => price.with_markup(per_mille),
            None => price,
        };
        Ok(Candidate::Listing { seller, mint, price })
    }

    /// Match the instruction tree against this marketplace's shapes.
    /// `Err` carries the reason the transaction is unrecognized.
    fn match_shape(&self, top: &[InstructionNode]) -> Result<Candidate, String> {
        if self.is_delisting(top) {
            self.delisting(top)
        } else if self.is_listing(top) {
            self.listing(top)
        } else if self.is_sale(top) {
            self.sale(top)
        } else {
            let counts: Vec<usize> = top.iter().map(|node| node.children.len()).collect();
            Err(format!(
                "{} top-level instructions with inner counts {counts:?} match no {} shape",
                top.len(),
                self.marketplace()
            ))
        }
    }
}

pub fn schema_for(marketplace: Marketplace) -> &'static dyn MarketplaceSchema {
    match marketplace {
        Marketplace::Solanart => &SolanartSchema,
        Marketplace::MonkeyBusiness => &MonkeyBusinessSchema,
        Marketplace::DigitalEyes => &DigitalEyesSchema,
    }
}

pub(crate) fn inner_count(top: &[InstructionNode], position: usize) -> Option<usize> {
    top.get(position).map(|node| node.children.len())
}

pub(crate) fn top_level(top: &[InstructionNode], position: usize) -> Result<&InstructionNode, String> {
    top.get(position)
        .ok_or_else(|| format!("missing top-level instruction #{position}"))
}

pub(crate) fn inner(
    top: &[InstructionNode],
    position: usize,
    child: usize,
) -> Result<&InstructionNode, String> {
    top_level(top, position)?
        .child(child)
        .ok_or_else(|| format!("missing inner instruction #{position}.{child}"))
}

pub(crate) fn address_field(node: &InstructionNode, field: &str) -> Result<Pubkey, String> {
    node.address(field)
        .ok_or_else(|| format!("{} instruction has no {field:?} address", node.name))
}

pub(crate) fn amount_field(node: &InstructionNode) -> Result<u64, String> {
    node.number(fields::AMOUNT)
        .ok_or_else(|| format!("{} instruction has no amount", node.name))
}

pub(crate) fn sum_amounts<I>(amounts: I) -> Result<Lamports, String>
where
    I: IntoIterator<Item = u64>,
{
    Lamports::checked_sum(amounts).ok_or_else(|| "sale amounts overflow".to_string())
}
