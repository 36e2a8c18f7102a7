//! Pragmatic buyer

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Move, NegotiationAgent, NegotiationView, Persona, PriceLimit};
use crate::error::{HaggleError, Result};
use crate::types::{Party, Product};

/// Buyer configuration, private to the buyer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuyerConfig {
    /// Never pay more than this
    pub budget_ceiling: Decimal,
    /// Where the buyer would like to land; caps the opening offer
    pub target_price: Decimal,
    /// Fraction of the gap to the seller's ask closed per turn
    pub concession_rate: Decimal,
    /// Remaining-round window in which any in-budget ask is accepted and
    /// an out-of-budget ask gets a final offer just under the ceiling
    #[serde(default = "default_patience")]
    pub max_rounds_patience: u32,
    /// Asks at or below market * ratio are taken immediately
    #[serde(default = "default_bargain_ratio")]
    pub bargain_ratio: Decimal,
}

fn default_patience() -> u32 {
    2
}

fn default_bargain_ratio() -> Decimal {
    Decimal::new(85, 2)
}

/// Share of the ceiling offered once the patience window opens
fn final_offer_ratio() -> Decimal {
    Decimal::new(99, 2)
}

impl BuyerConfig {
    pub fn new(budget_ceiling: Decimal, target_price: Decimal, concession_rate: Decimal) -> Self {
        Self {
            budget_ceiling,
            target_price,
            concession_rate,
            max_rounds_patience: default_patience(),
            bargain_ratio: default_bargain_ratio(),
        }
    }

    pub fn with_patience(mut self, rounds: u32) -> Self {
        self.max_rounds_patience = rounds;
        self
    }

    pub fn with_bargain_ratio(mut self, ratio: Decimal) -> Self {
        self.bargain_ratio = ratio;
        self
    }

    /// Check prices are positive, target within budget, rates within [0, 1]
    pub fn validate(&self) -> Result<()> {
        if self.budget_ceiling <= Decimal::ZERO {
            return Err(HaggleError::config(
                "buyer.budget_ceiling",
                format!("must be positive, got {}", self.budget_ceiling),
            ));
        }
        if self.target_price <= Decimal::ZERO {
            return Err(HaggleError::config(
                "buyer.target_price",
                format!("must be positive, got {}", self.target_price),
            ));
        }
        if self.target_price > self.budget_ceiling {
            return Err(HaggleError::config(
                "buyer.target_price",
                format!(
                    "target {} exceeds budget ceiling {}",
                    self.target_price, self.budget_ceiling
                ),
            ));
        }
        if !(Decimal::ZERO..=Decimal::ONE).contains(&self.concession_rate) {
            return Err(HaggleError::config(
                "buyer.concession_rate",
                format!("must be within [0, 1], got {}", self.concession_rate),
            ));
        }
        if self.bargain_ratio <= Decimal::ZERO || self.bargain_ratio > Decimal::ONE {
            return Err(HaggleError::config(
                "buyer.bargain_ratio",
                format!("must be within (0, 1], got {}", self.bargain_ratio),
            ));
        }
        Ok(())
    }
}

/// Buyer that closes the gap to the seller's ask at a fixed rate and
/// grows more willing to accept as the round budget runs out.
#[derive(Clone, Debug)]
pub struct BuyerAgent {
    config: BuyerConfig,
    persona: Persona,
}

impl BuyerAgent {
    pub fn new(config: BuyerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            persona: default_persona(),
        })
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn config(&self) -> &BuyerConfig {
        &self.config
    }

    /// Opening bid anchored on product quality, never above target or ceiling
    fn opening_price(&self, product: &Product) -> Decimal {
        let anchored = (product.market_price() * product.quality().opening_anchor())
            .round_dp(2)
            .normalize();
        anchored
            .min(self.config.target_price)
            .min(self.config.budget_ceiling)
    }

    /// Last bid near the ceiling when time is short and the ask is still out of budget
    fn final_offer(&self, last: Decimal) -> Decimal {
        (self.config.budget_ceiling * final_offer_ratio())
            .round_dp(2)
            .normalize()
            .max(last)
            .min(self.config.budget_ceiling)
    }

    /// Acceptance level rising from target to ceiling over the round budget
    fn moving_target(&self, view: &NegotiationView<'_>) -> Decimal {
        let span = self.config.budget_ceiling - self.config.target_price;
        self.config.target_price + span * view.progress()
    }

    fn should_accept(&self, view: &NegotiationView<'_>, ask: Decimal) -> bool {
        if ask > self.config.budget_ceiling {
            return false;
        }

        let bargain = view.product.market_price() * self.config.bargain_ratio;
        ask <= self.moving_target(view)
            || ask <= bargain
            || view.remaining_rounds() <= self.config.max_rounds_patience
    }

    fn counter_price(&self, last: Decimal, ask: Decimal) -> Decimal {
        let step = (ask - last) * self.config.concession_rate;
        (last + step)
            .round_dp(2)
            .normalize()
            .min(self.config.budget_ceiling)
            .max(last)
    }
}

impl NegotiationAgent for BuyerAgent {
    fn party(&self) -> Party {
        Party::Buyer
    }

    fn persona(&self) -> &Persona {
        &self.persona
    }

    fn price_limit(&self) -> PriceLimit {
        PriceLimit::Ceiling(self.config.budget_ceiling)
    }

    fn next_move(&self, view: &NegotiationView<'_>) -> Move {
        let turn = view.offers_made_by(Party::Buyer);
        let own_last = view.last_offer_by(Party::Buyer).map(|o| o.price);

        let Some(ask) = view.last_offer_by(Party::Seller).map(|o| o.price) else {
            let price = self.opening_price(view.product);
            return Move::Counter {
                price,
                message: Some(format!(
                    "For {} {} I can start at {}. {}",
                    view.product.quality(),
                    view.product.name(),
                    price,
                    self.persona.catchphrase(turn)
                )),
            };
        };

        if self.should_accept(view, ask) {
            return Move::Accept {
                message: Some(format!("{} works for me. Let's close at that.", ask)),
            };
        }

        let end_game = view.remaining_rounds() <= self.config.max_rounds_patience;
        let price = match own_last {
            Some(last) if end_game => self.final_offer(last),
            Some(last) => self.counter_price(last, ask),
            None => self.opening_price(view.product),
        };
        let message = if end_game && own_last.is_some() {
            format!("{} is my final offer. {}", price, self.persona.catchphrase(turn))
        } else if price >= self.config.budget_ceiling {
            format!("{} is as far as I can go.", price)
        } else {
            format!("I can move up to {}. {}", price, self.persona.catchphrase(turn))
        };

        Move::Counter {
            price,
            message: Some(message),
        }
    }
}

fn default_persona() -> Persona {
    Persona {
        name: "Pragmatic Buyer".to_string(),
        style: "calm, data-driven, firm near the end".to_string(),
        catchphrases: vec![
            "Let's find a price that works for both of us.".to_string(),
            "The numbers point to a different value.".to_string(),
            "I'd like to close this today.".to_string(),
        ],
    }
}
