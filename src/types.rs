//! Core types used throughout haggle

use blake2::{Blake2b512, Digest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{HaggleError, Result};

/// Side of the table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Buyer,
    Seller,
}

impl Party {
    /// The other side of the table
    pub fn opponent(self) -> Party {
        match self {
            Party::Buyer => Party::Seller,
            Party::Seller => Party::Buyer,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Party::Buyer => "buyer",
            Party::Seller => "seller",
        })
    }
}

/// Quality grade of the goods
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    A,
    B,
    Export,
}

impl QualityGrade {
    /// Premium grades anchor offers closer to market
    pub fn is_premium(self) -> bool {
        matches!(self, QualityGrade::A | QualityGrade::Export)
    }

    /// Fraction of market price a buyer opens at for this grade
    pub fn opening_anchor(self) -> Decimal {
        if self.is_premium() {
            Decimal::new(68, 2)
        } else {
            Decimal::new(58, 2)
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityGrade::A => write!(f, "grade A"),
            QualityGrade::B => write!(f, "grade B"),
            QualityGrade::Export => write!(f, "export grade"),
        }
    }
}

/// The item under negotiation. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Product {
    name: String,
    category: String,
    quantity: u32,
    quality: QualityGrade,
    origin: String,
    market_price: Decimal,
    attributes: BTreeMap<String, String>,
}

impl Product {
    /// Build a product, rejecting empty names, zero quantity and non-positive prices
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: u32,
        quality: QualityGrade,
        origin: impl Into<String>,
        market_price: Decimal,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HaggleError::config("product.name", "must not be empty"));
        }
        if quantity == 0 {
            return Err(HaggleError::config("product.quantity", "must be positive"));
        }
        if market_price <= Decimal::ZERO {
            return Err(HaggleError::config(
                "product.market_price",
                format!("must be positive, got {}", market_price),
            ));
        }

        Ok(Self {
            name,
            category: category.into(),
            quantity,
            quality,
            origin: origin.into(),
            market_price,
            attributes: BTreeMap::new(),
        })
    }

    /// Attach free-form attributes (consumes and returns the product)
    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn quality(&self) -> QualityGrade {
        self.quality
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn market_price(&self) -> Decimal {
        self.market_price
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} ({}, {}, from {}) @ market {}",
            self.quantity, self.name, self.category, self.quality, self.origin, self.market_price
        )
    }
}

/// Blake2b 256-bit digest of a negotiation transcript
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptHash(pub [u8; 32]);

impl TranscriptHash {
    /// Hash arbitrary bytes with Blake2b, truncated to 32 bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result[..32]);
        TranscriptHash(hash)
    }

    /// Get hash as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hash from its hex form
    pub fn from_hex(hex_str: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(TranscriptHash(hash))
    }
}

impl fmt::Display for TranscriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
