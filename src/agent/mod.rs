//! Negotiating agents
//!
//! Every participant implements [`NegotiationAgent`]. The session hands each
//! agent a read-only [`NegotiationView`] and gets back a [`Move`]. Agents hold
//! their private limits themselves and never see the other side's state.

pub mod buyer;
pub mod seller;

pub use buyer::{BuyerAgent, BuyerConfig};
pub use seller::{Personality, SellerAgent, SellerConfig};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::negotiation::Offer;
use crate::types::{Party, Product};

/// What an agent does on its turn
#[derive(Clone, Debug, PartialEq)]
pub enum Move {
    /// Propose a new price
    Counter {
        price: Decimal,
        message: Option<String>,
    },
    /// Take the opponent's standing offer
    Accept { message: Option<String> },
    /// Walk away
    Reject { reason: String },
}

/// The agent's own hard limit on price
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceLimit {
    /// Buyer: never pay more than this
    Ceiling(Decimal),
    /// Seller: never sell below this
    Floor(Decimal),
}

impl PriceLimit {
    /// Whether a price is within this limit
    pub fn permits(&self, price: Decimal) -> bool {
        match *self {
            PriceLimit::Ceiling(ceiling) => price <= ceiling,
            PriceLimit::Floor(floor) => price >= floor,
        }
    }
}

impl std::fmt::Display for PriceLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceLimit::Ceiling(d) => write!(f, "ceiling {}", d),
            PriceLimit::Floor(d) => write!(f, "floor {}", d),
        }
    }
}

/// Public face of an agent: the only thing a message generator sees
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub style: String,
    pub catchphrases: Vec<String>,
}

impl Persona {
    /// Catchphrase for a given turn, cycling through the list
    pub fn catchphrase(&self, turn: usize) -> &str {
        if self.catchphrases.is_empty() {
            return "";
        }
        &self.catchphrases[turn % self.catchphrases.len()]
    }
}

/// Read-only snapshot handed to an agent on its turn
#[derive(Clone, Copy, Debug)]
pub struct NegotiationView<'a> {
    pub product: &'a Product,
    pub history: &'a [Offer],
    pub round: u32,
    pub max_rounds: u32,
}

impl<'a> NegotiationView<'a> {
    /// Most recent offer from one party
    pub fn last_offer_by(&self, party: Party) -> Option<&'a Offer> {
        self.history.iter().rev().find(|o| o.proposer == party)
    }

    /// Number of offers one party has made so far
    pub fn offers_made_by(&self, party: Party) -> usize {
        self.history.iter().filter(|o| o.proposer == party).count()
    }

    /// Rounds left in the budget, including the current one
    pub fn remaining_rounds(&self) -> u32 {
        self.max_rounds.saturating_sub(self.round)
    }

    /// Fraction of the round budget already spent, in [0, 1]
    pub fn progress(&self) -> Decimal {
        if self.max_rounds == 0 {
            return Decimal::ONE;
        }
        let spent = Decimal::from(self.round.min(self.max_rounds));
        spent / Decimal::from(self.max_rounds)
    }
}

/// A negotiation participant
pub trait NegotiationAgent: Send + Sync {
    /// Which side this agent plays
    fn party(&self) -> Party;

    /// Public persona for message decoration
    fn persona(&self) -> &Persona;

    /// Hard limit the session enforces on this agent's prices
    fn price_limit(&self) -> PriceLimit;

    /// Decide the next move from the visible history
    fn next_move(&self, view: &NegotiationView<'_>) -> Move;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QualityGrade;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_limit_permits() {
        let ceiling = PriceLimit::Ceiling(dec!(90));
        assert!(ceiling.permits(dec!(90)));
        assert!(!ceiling.permits(dec!(90.01)));

        let floor = PriceLimit::Floor(dec!(80));
        assert!(floor.permits(dec!(80)));
        assert!(!floor.permits(dec!(79.99)));
    }

    #[test]
    fn test_view_helpers() {
        let product = Product::new("Rice", "grain", 10, QualityGrade::B, "Punjab", dec!(100)).unwrap();
        let history = vec![
            Offer { round: 0, proposer: Party::Buyer, price: dec!(70), message: None },
            Offer { round: 1, proposer: Party::Seller, price: dec!(120), message: None },
            Offer { round: 2, proposer: Party::Buyer, price: dec!(80), message: None },
        ];
        let view = NegotiationView {
            product: &product,
            history: &history,
            round: 3,
            max_rounds: 10,
        };

        assert_eq!(view.last_offer_by(Party::Buyer).map(|o| o.price), Some(dec!(80)));
        assert_eq!(view.last_offer_by(Party::Seller).map(|o| o.price), Some(dec!(120)));
        assert_eq!(view.offers_made_by(Party::Buyer), 2);
        assert_eq!(view.remaining_rounds(), 7);
        assert_eq!(view.progress(), dec!(0.3));
    }

    #[test]
    fn test_persona_catchphrase_cycles() {
        let persona = Persona {
            name: "Test".to_string(),
            style: "terse".to_string(),
            catchphrases: vec!["one".to_string(), "two".to_string()],
        };
        assert_eq!(persona.catchphrase(0), "one");
        assert_eq!(persona.catchphrase(3), "two");
    }
}
