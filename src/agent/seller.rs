//! Mock seller with a fixed, repeatable concession schedule

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Move, NegotiationAgent, NegotiationView, Persona, PriceLimit};
use crate::error::{HaggleError, Result};
use crate::types::Party;

/// How readily the seller gives ground
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Aggressive,
    #[default]
    Cooperative,
    Stubborn,
}

impl Personality {
    /// Multiplier applied to the configured concession rate
    pub fn concession_factor(self) -> Decimal {
        match self {
            Personality::Cooperative => Decimal::ONE,
            Personality::Aggressive => Decimal::new(6, 1),
            Personality::Stubborn => Decimal::new(3, 1),
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Personality::Aggressive => write!(f, "aggressive"),
            Personality::Cooperative => write!(f, "cooperative"),
            Personality::Stubborn => write!(f, "stubborn"),
        }
    }
}

/// Seller configuration, private to the seller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SellerConfig {
    pub start_price: Decimal,
    /// Reservation price; the seller never goes below it
    pub floor_price: Decimal,
    /// Fraction of the standing ask given up per turn
    pub concession_rate: Decimal,
    #[serde(default)]
    pub personality: Personality,
}

impl SellerConfig {
    pub fn new(start_price: Decimal, floor_price: Decimal, concession_rate: Decimal) -> Self {
        Self {
            start_price,
            floor_price,
            concession_rate,
            personality: Personality::default(),
        }
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_price <= Decimal::ZERO {
            return Err(HaggleError::config(
                "seller.start_price",
                format!("must be positive, got {}", self.start_price),
            ));
        }
        if self.floor_price <= Decimal::ZERO {
            return Err(HaggleError::config(
                "seller.floor_price",
                format!("must be positive, got {}", self.floor_price),
            ));
        }
        if self.floor_price > self.start_price {
            return Err(HaggleError::config(
                "seller.floor_price",
                format!(
                    "floor {} exceeds start price {}",
                    self.floor_price, self.start_price
                ),
            ));
        }
        if !(Decimal::ZERO..=Decimal::ONE).contains(&self.concession_rate) {
            return Err(HaggleError::config(
                "seller.concession_rate",
                format!("must be within [0, 1], got {}", self.concession_rate),
            ));
        }
        Ok(())
    }

    /// Concession rate after the personality factor
    pub fn effective_rate(&self) -> Decimal {
        (self.concession_rate * self.personality.concession_factor()).min(Decimal::ONE)
    }
}

/// Seller whose asks follow `ask' = max(floor, ask * (1 - rate))`,
/// independent of what the buyer offers.
#[derive(Clone, Debug)]
pub struct SellerAgent {
    config: SellerConfig,
    persona: Persona,
}

impl SellerAgent {
    pub fn new(config: SellerConfig) -> Result<Self> {
        config.validate()?;
        let persona = persona_for(config.personality);
        Ok(Self { config, persona })
    }

    pub fn config(&self) -> &SellerConfig {
        &self.config
    }

    /// The ask that follows `last` in the schedule
    pub fn next_ask(&self, last: Decimal) -> Decimal {
        let cut = last * self.config.effective_rate();
        (last - cut)
            .round_dp(2)
            .normalize()
            .max(self.config.floor_price)
            .min(last)
    }
}

impl NegotiationAgent for SellerAgent {
    fn party(&self) -> Party {
        Party::Seller
    }

    fn persona(&self) -> &Persona {
        &self.persona
    }

    fn price_limit(&self) -> PriceLimit {
        PriceLimit::Floor(self.config.floor_price)
    }

    fn next_move(&self, view: &NegotiationView<'_>) -> Move {
        let turn = view.offers_made_by(Party::Seller);
        let ask = match view.last_offer_by(Party::Seller) {
            Some(last) => self.next_ask(last.price),
            None => self.config.start_price,
        };

        if let Some(bid) = view.last_offer_by(Party::Buyer).map(|o| o.price) {
            let last_chance = view.remaining_rounds() <= 1 && bid >= self.config.floor_price;
            if bid >= ask || last_chance {
                return Move::Accept {
                    message: Some(format!("Deal at {}.", bid)),
                };
            }
        }

        Move::Counter {
            price: ask,
            message: Some(format!("I can do {}. {}", ask, self.persona.catchphrase(turn))),
        }
    }
}

fn persona_for(personality: Personality) -> Persona {
    let (style, catchphrases) = match personality {
        Personality::Aggressive => (
            "pushy, anchors high",
            vec!["This is premium stock.", "Other buyers are waiting."],
        ),
        Personality::Cooperative => (
            "friendly, meets halfway",
            vec!["I want this to work for you.", "Let's meet somewhere fair."],
        ),
        Personality::Stubborn => (
            "immovable, slow to concede",
            vec!["The price reflects the quality.", "I won't go much lower."],
        ),
    };

    Persona {
        name: format!("Mock Seller ({})", personality),
        style: style.to_string(),
        catchphrases: catchphrases.into_iter().map(String::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::Offer;
    use crate::types::{Product, QualityGrade};
    use rust_decimal_macros::dec;

    fn product() -> Product {
        Product::new("Saffron", "spice", 2, QualityGrade::Export, "Pampore", dec!(100)).unwrap()
    }

    fn seller(personality: Personality) -> SellerAgent {
        SellerAgent::new(
            SellerConfig::new(dec!(120), dec!(80), dec!(0.15)).with_personality(personality),
        )
        .unwrap()
    }

    fn offer(round: u32, proposer: Party, price: Decimal) -> Offer {
        Offer {
            round,
            proposer,
            price,
            message: None,
        }
    }

    #[test]
    fn test_opening_ask_is_start_price() {
        let product = product();
        let history = vec![offer(0, Party::Buyer, dec!(70))];
        let view = NegotiationView {
            product: &product,
            history: &history,
            round: 1,
            max_rounds: 10,
        };

        match seller(Personality::Cooperative).next_move(&view) {
            Move::Counter { price, .. } => assert_eq!(price, dec!(120)),
            other => panic!("expected counter, got {:?}", other),
        }
    }

    #[test]
    fn test_schedule_is_non_increasing_and_floored() {
        for personality in [
            Personality::Aggressive,
            Personality::Cooperative,
            Personality::Stubborn,
        ] {
            let agent = seller(personality);
            let mut ask = dec!(120);
            for _ in 0..50 {
                let next = agent.next_ask(ask);
                assert!(next <= ask, "{} seller raised its ask", personality);
                assert!(next >= dec!(80));
                ask = next;
            }
            assert_eq!(ask, dec!(80));
        }
    }

    #[test]
    fn test_personality_scales_concession() {
        assert_eq!(seller(Personality::Cooperative).next_ask(dec!(120)), dec!(102));
        assert_eq!(seller(Personality::Aggressive).next_ask(dec!(120)), dec!(109.2));
        assert_eq!(seller(Personality::Stubborn).next_ask(dec!(120)), dec!(114.6));
    }

    #[test]
    fn test_accepts_bid_at_or_above_next_ask() {
        let product = product();
        let history = vec![
            offer(0, Party::Buyer, dec!(70)),
            offer(1, Party::Seller, dec!(120)),
            offer(2, Party::Buyer, dec!(103)),
        ];
        let view = NegotiationView {
            product: &product,
            history: &history,
            round: 3,
            max_rounds: 10,
        };

        assert!(matches!(
            seller(Personality::Cooperative).next_move(&view),
            Move::Accept { .. }
        ));
    }

    #[test]
    fn test_last_chance_accepts_above_floor_only() {
        let product = product();
        let history = vec![
            offer(0, Party::Seller, dec!(120)),
            offer(1, Party::Buyer, dec!(81)),
        ];
        let last_turn = NegotiationView {
            product: &product,
            history: &history,
            round: 9,
            max_rounds: 10,
        };
        assert!(matches!(
            seller(Personality::Stubborn).next_move(&last_turn),
            Move::Accept { .. }
        ));

        let low = vec![
            offer(0, Party::Seller, dec!(120)),
            offer(1, Party::Buyer, dec!(79)),
        ];
        let view = NegotiationView {
            history: &low,
            ..last_turn
        };
        assert!(matches!(
            seller(Personality::Stubborn).next_move(&view),
            Move::Counter { .. }
        ));
    }

    #[test]
    fn test_floor_above_start_is_configuration_error() {
        let err = SellerAgent::new(SellerConfig::new(dec!(80), dec!(120), dec!(0.1))).unwrap_err();
        assert!(matches!(err, HaggleError::Configuration { ref field, .. } if field == "seller.floor_price"));
    }

    #[test]
    fn test_personality_serde() {
        let config: SellerConfig = serde_json::from_str(
            r#"{"start_price": "120", "floor_price": "80", "concession_rate": "0.15", "personality": "stubborn"}"#,
        )
        .unwrap();
        assert_eq!(config.personality, Personality::Stubborn);

        let config: SellerConfig = serde_json::from_str(
            r#"{"start_price": "120", "floor_price": "80", "concession_rate": "0.15"}"#,
        )
        .unwrap();
        assert_eq!(config.personality, Personality::Cooperative);
    }
}
