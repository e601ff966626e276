//! Credit packs sold through the payment provider.
//!
//! The table is fixed at compile time. Each pack binds a credit count to a
//! price; the credit count travels back to the client in the checkout success
//! URL, there is no server-side ledger.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::price::{CurrencyCode, Price};

/// Errors that can occur when parsing a [`PackId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// The identifier is not one of the known packs.
    #[error("unknown credit pack: {0}")]
    Unknown(String),
}

/// Identifier of a purchasable credit pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackId {
    #[serde(rename = "pack_10")]
    Pack10,
    #[serde(rename = "pack_30")]
    Pack30,
    #[serde(rename = "pack_100")]
    Pack100,
}

impl PackId {
    /// Every pack, in display order.
    pub const ALL: [Self; 3] = [Self::Pack10, Self::Pack30, Self::Pack100];

    /// Wire name of the pack (e.g., `pack_30`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pack10 => "pack_10",
            Self::Pack30 => "pack_30",
            Self::Pack100 => "pack_100",
        }
    }

    /// Look up the pack definition for this identifier.
    #[must_use]
    pub const fn pack(self) -> CreditPack {
        match self {
            Self::Pack10 => CreditPack {
                id: self,
                credits: 10,
                name: "10 Try-On Credits",
                unit_amount_cents: 499,
            },
            Self::Pack30 => CreditPack {
                id: self,
                credits: 30,
                name: "30 Try-On Credits",
                unit_amount_cents: 999,
            },
            Self::Pack100 => CreditPack {
                id: self,
                credits: 100,
                name: "100 Try-On Credits",
                unit_amount_cents: 2499,
            },
        }
    }
}

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackId {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pack_10" => Ok(Self::Pack10),
            "pack_30" => Ok(Self::Pack30),
            "pack_100" => Ok(Self::Pack100),
            _ => Err(PackError::Unknown(s.to_string())),
        }
    }
}

/// A purchasable bundle of generation credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditPack {
    /// Pack identifier.
    pub id: PackId,
    /// Credits granted after a successful payment.
    pub credits: u32,
    /// Product name shown on the checkout page.
    pub name: &'static str,
    /// Price in minor units of the configured currency.
    pub unit_amount_cents: i64,
}

impl CreditPack {
    /// All packs, in display order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        PackId::ALL.iter().map(|id| id.pack()).collect()
    }

    /// Price of this pack in the given currency.
    #[must_use]
    pub fn price(&self, currency: CurrencyCode) -> Price {
        Price::from_cents(self.unit_amount_cents, currency)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_packs() {
        assert_eq!("pack_10".parse::<PackId>(), Ok(PackId::Pack10));
        assert_eq!("pack_30".parse::<PackId>(), Ok(PackId::Pack30));
        assert_eq!("pack_100".parse::<PackId>(), Ok(PackId::Pack100));
    }

    #[test]
    fn test_parse_unknown_pack() {
        assert_eq!(
            "pack_1000".parse::<PackId>(),
            Err(PackError::Unknown("pack_1000".to_string()))
        );
        assert!("PACK_10".parse::<PackId>().is_err());
        assert!("".parse::<PackId>().is_err());
    }

    #[test]
    fn test_credit_counts() {
        assert_eq!(PackId::Pack10.pack().credits, 10);
        assert_eq!(PackId::Pack30.pack().credits, 30);
        assert_eq!(PackId::Pack100.pack().credits, 100);
    }

    #[test]
    fn test_display_matches_wire_name() {
        for id in PackId::ALL {
            assert_eq!(id.to_string().parse::<PackId>(), Ok(id));
        }
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&PackId::Pack30).unwrap();
        assert_eq!(json, "\"pack_30\"");
    }

    #[test]
    fn test_serde_agrees_with_from_str() {
        for id in PackId::ALL {
            let json = serde_json::to_value(id).unwrap();
            assert_eq!(json, serde_json::Value::from(id.as_str()));
            assert_eq!(serde_json::from_value::<PackId>(json).unwrap(), id);
        }
    }

    #[test]
    fn test_price_in_currency() {
        let price = PackId::Pack30.pack().price(CurrencyCode::EUR);
        assert_eq!(price.minor_units(), Some(999));
    }
}
