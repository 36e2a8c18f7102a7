//! Scenario files: product, both agent configurations and session options

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::agent::{BuyerAgent, BuyerConfig, SellerAgent, SellerConfig};
use crate::error::{HaggleError, Result};
use crate::negotiation::{NegotiationSession, SessionConfig};
use crate::types::{Product, QualityGrade};

/// Product section of a scenario file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductConfig {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub quantity: u32,
    pub quality: QualityGrade,
    #[serde(default)]
    pub origin: String,
    pub market_price: Decimal,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ProductConfig {
    pub fn build(&self) -> Result<Product> {
        Product::new(
            self.name.clone(),
            self.category.clone(),
            self.quantity,
            self.quality,
            self.origin.clone(),
            self.market_price,
        )
        .map(|p| p.with_attributes(self.attributes.clone()))
    }
}

/// One negotiation setup, as read from JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub product: ProductConfig,
    pub buyer: BuyerConfig,
    pub seller: SellerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Scenario {
    /// Parse and validate a scenario from JSON text.
    ///
    /// Malformed JSON is a [`HaggleError::ScenarioParse`]; a well-formed
    /// document with a wrongly typed or unknown field is a configuration
    /// error naming that field's path.
    pub fn from_json(text: &str) -> Result<Self> {
        let de = &mut serde_json::Deserializer::from_str(text);
        let scenario: Scenario = serde_path_to_error::deserialize(de).map_err(parse_error)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read a scenario file; an unnamed scenario takes the file stem as its name
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut scenario = Self::from_json(&text).map_err(|e| match e {
            HaggleError::ScenarioParse(msg) => {
                HaggleError::ScenarioParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        if scenario.name.is_empty() {
            scenario.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scenario".to_string());
        }

        tracing::debug!("Loaded scenario {} from {}", scenario.name, path.display());
        Ok(scenario)
    }

    /// Check every section; the first invalid field is reported
    pub fn validate(&self) -> Result<()> {
        self.product.build()?;
        self.buyer.validate()?;
        self.seller.validate()?;
        self.session.validate()?;
        Ok(())
    }

    /// Build a fresh, unstarted session for this scenario
    pub fn build_session(&self) -> Result<NegotiationSession> {
        NegotiationSession::new(
            self.product.build()?,
            Box::new(BuyerAgent::new(self.buyer.clone())?),
            Box::new(SellerAgent::new(self.seller.clone())?),
            self.session.clone(),
        )
    }
}

fn parse_error(err: serde_path_to_error::Error<serde_json::Error>) -> HaggleError {
    let field = err.path().to_string();
    let inner = err.into_inner();
    match inner.classify() {
        serde_json::error::Category::Data if field != "." => HaggleError::config(field, inner.to_string()),
        _ => HaggleError::ScenarioParse(inner.to_string()),
    }
}
