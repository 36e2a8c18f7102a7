//! Negotiation types and state machine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HaggleError, Result};
use crate::types::{Party, TranscriptHash};

/// Default round budget for a session
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// A price proposal attributed to one party
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Zero-based position in the session history
    pub round: u32,
    pub proposer: Party,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Session lifecycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NegotiationState {
    /// Built but not started
    Init,
    /// Turns are being exchanged
    InProgress { round: u32, to_move: Party },
    /// A price was agreed
    DealAccepted { price: Decimal },
    /// One side walked away or made an invalid move
    DealRejected { reason: String },
    /// Round budget spent or session aborted
    RoundsExhausted,
}

impl NegotiationState {
    /// Check if negotiation is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationState::DealAccepted { .. }
                | NegotiationState::DealRejected { .. }
                | NegotiationState::RoundsExhausted
        )
    }

    /// Check if negotiation is active
    pub fn is_active(&self) -> bool {
        matches!(self, NegotiationState::InProgress { .. })
    }
}

/// How a session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Termination {
    Accept,
    Reject,
    MaxRounds,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Accept => write!(f, "ACCEPT"),
            Termination::Reject => write!(f, "REJECT"),
            Termination::MaxRounds => write!(f, "MAX_ROUNDS"),
        }
    }
}

/// Session-level options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_first_proposer")]
    pub first_proposer: Party,
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

fn default_first_proposer() -> Party {
    Party::Buyer
}

impl SessionConfig {
    pub fn new(max_rounds: u32, first_proposer: Party) -> Self {
        Self {
            max_rounds,
            first_proposer,
        }
    }

    /// Reject a zero round budget
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(HaggleError::config(
                "session.max_rounds",
                "must be a positive integer",
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUNDS, Party::Buyer)
    }
}

/// Final record of a session, produced once at termination
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NegotiationOutcome {
    deal_reached: bool,
    final_price: Option<Decimal>,
    rounds_used: u32,
    savings: Decimal,
    terminated_by: Termination,
    market_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
    history: Vec<Offer>,
    transcript_hash: TranscriptHash,
}

impl NegotiationOutcome {
    /// Outcome for an agreed price
    pub(crate) fn deal(
        final_price: Decimal,
        rounds_used: u32,
        market_price: Decimal,
        history: Vec<Offer>,
    ) -> Self {
        let transcript_hash = transcript_hash(&history);
        Self {
            deal_reached: true,
            final_price: Some(final_price),
            rounds_used,
            savings: market_price - final_price,
            terminated_by: Termination::Accept,
            market_price,
            rejection_reason: None,
            history,
            transcript_hash,
        }
    }

    /// Outcome without agreement
    pub(crate) fn no_deal(
        terminated_by: Termination,
        rounds_used: u32,
        market_price: Decimal,
        rejection_reason: Option<String>,
        history: Vec<Offer>,
    ) -> Self {
        let transcript_hash = transcript_hash(&history);
        Self {
            deal_reached: false,
            final_price: None,
            rounds_used,
            savings: Decimal::ZERO,
            terminated_by,
            market_price,
            rejection_reason,
            history,
            transcript_hash,
        }
    }

    pub fn deal_reached(&self) -> bool {
        self.deal_reached
    }

    pub fn final_price(&self) -> Option<Decimal> {
        self.final_price
    }

    pub fn rounds_used(&self) -> u32 {
        self.rounds_used
    }

    pub fn savings(&self) -> Decimal {
        self.savings
    }

    pub fn terminated_by(&self) -> Termination {
        self.terminated_by
    }

    pub fn market_price(&self) -> Decimal {
        self.market_price
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn history(&self) -> &[Offer] {
        &self.history
    }

    pub fn transcript_hash(&self) -> &TranscriptHash {
        &self.transcript_hash
    }

    /// Re-derive savings from the stored price fields
    pub fn recompute_savings(&self) -> Decimal {
        match self.final_price {
            Some(price) if self.deal_reached => self.market_price - price,
            _ => Decimal::ZERO,
        }
    }

    /// Savings as a percentage of market price. `None` when the ratio
    /// does not fit in a `Decimal`.
    pub fn savings_pct(&self) -> Option<Decimal> {
        if self.market_price.is_zero() {
            return Some(Decimal::ZERO);
        }
        self.savings
            .checked_div(self.market_price)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }

    /// Offers made by one party, in order
    pub fn offers_by(&self, party: Party) -> impl Iterator<Item = &Offer> {
        self.history.iter().filter(move |o| o.proposer == party)
    }
}

/// Digest of the price-bearing content of a history
pub fn transcript_hash(history: &[Offer]) -> TranscriptHash {
    let mut bytes = Vec::new();
    for offer in history {
        bytes.extend_from_slice(
            format!(
                "{}|{}|{}|{}\n",
                offer.round,
                offer.proposer,
                offer.price.normalize(),
                offer.message.as_deref().unwrap_or("")
            )
            .as_bytes(),
        );
    }
    TranscriptHash::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn offer(round: u32, proposer: Party, price: Decimal) -> Offer {
        Offer {
            round,
            proposer,
            price,
            message: None,
        }
    }

    #[test]
    fn test_state_terminal() {
        assert!(NegotiationState::RoundsExhausted.is_terminal());
        assert!(NegotiationState::DealAccepted { price: dec!(85) }.is_terminal());
        assert!(NegotiationState::DealRejected {
            reason: "walked away".to_string()
        }
        .is_terminal());

        let running = NegotiationState::InProgress {
            round: 3,
            to_move: Party::Seller,
        };
        assert!(!running.is_terminal());
        assert!(running.is_active());
        assert!(!NegotiationState::Init.is_active());
    }

    #[test]
    fn test_deal_outcome_savings() {
        let history = vec![offer(0, Party::Buyer, dec!(70)), offer(1, Party::Seller, dec!(88))];
        let outcome = NegotiationOutcome::deal(dec!(88), 2, dec!(100), history);

        assert!(outcome.deal_reached());
        assert_eq!(outcome.final_price(), Some(dec!(88)));
        assert_eq!(outcome.savings(), dec!(12));
        assert_eq!(outcome.recompute_savings(), outcome.savings());
        assert_eq!(outcome.savings_pct(), Some(dec!(12)));
        assert_eq!(outcome.terminated_by(), Termination::Accept);
    }

    #[test]
    fn test_savings_pct_with_extreme_prices() {
        let huge_market = dec!(1000000000000000000000000000);
        let outcome = NegotiationOutcome::deal(dec!(86.7), 7, huge_market, vec![]);
        let pct = outcome.savings_pct().unwrap();
        assert!(pct > dec!(99.99) && pct <= dec!(100));

        let outcome = NegotiationOutcome::deal(Decimal::MAX, 7, dec!(0.0000000001), vec![]);
        assert_eq!(outcome.savings_pct(), None);
    }

    #[test]
    fn test_no_deal_outcome_has_zero_savings() {
        let outcome = NegotiationOutcome::no_deal(Termination::MaxRounds, 10, dec!(100), None, vec![]);

        assert!(!outcome.deal_reached());
        assert_eq!(outcome.final_price(), None);
        assert_eq!(outcome.savings(), Decimal::ZERO);
        assert_eq!(outcome.recompute_savings(), Decimal::ZERO);
    }

    #[test]
    fn test_transcript_hash_ignores_decimal_scale() {
        let a = vec![offer(0, Party::Buyer, dec!(80.0))];
        let b = vec![offer(0, Party::Buyer, dec!(80))];
        assert_eq!(transcript_hash(&a), transcript_hash(&b));

        let c = vec![offer(0, Party::Seller, dec!(80))];
        assert_ne!(transcript_hash(&a), transcript_hash(&c));
    }

    #[test]
    fn test_session_config_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert!(config.validate().is_ok());

        let zero = SessionConfig::new(0, Party::Seller);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_termination_serialization() {
        let json = serde_json::to_string(&Termination::MaxRounds).unwrap();
        assert_eq!(json, "\"MAX_ROUNDS\"");
    }
}
