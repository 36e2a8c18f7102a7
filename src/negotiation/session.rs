//! Negotiation session management

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::types::{NegotiationOutcome, NegotiationState, Offer, SessionConfig, Termination};
use crate::agent::{Move, NegotiationAgent, NegotiationView};
use crate::error::{HaggleError, Result};
use crate::messaging::{generate_with_timeout, MessageGenerator, MessageRequest, DEFAULT_MESSAGE_TIMEOUT};
use crate::types::{Party, Product};

/// A negotiation between one buyer and one seller over a bounded number of rounds
pub struct NegotiationSession {
    product: Product,
    buyer: Box<dyn NegotiationAgent>,
    seller: Box<dyn NegotiationAgent>,
    config: SessionConfig,
    state: NegotiationState,
    history: Vec<Offer>,
    round: u32,
    to_move: Party,
    generator: Option<Arc<dyn MessageGenerator>>,
    message_timeout: Duration,
    cancel: CancellationToken,
    outcome: Option<NegotiationOutcome>,
}

impl NegotiationSession {
    /// Create a session; fails on a bad round budget or agents seated on the wrong side
    pub fn new(
        product: Product,
        buyer: Box<dyn NegotiationAgent>,
        seller: Box<dyn NegotiationAgent>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;
        if buyer.party() != Party::Buyer {
            return Err(HaggleError::config("buyer", "agent does not play the buyer side"));
        }
        if seller.party() != Party::Seller {
            return Err(HaggleError::config("seller", "agent does not play the seller side"));
        }

        Ok(Self {
            product,
            buyer,
            seller,
            to_move: config.first_proposer,
            config,
            state: NegotiationState::Init,
            history: Vec::new(),
            round: 0,
            generator: None,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            cancel: CancellationToken::new(),
            outcome: None,
        })
    }

    /// Decorate offers with an external message generator
    pub fn with_message_generator(mut self, generator: Arc<dyn MessageGenerator>, timeout: Duration) -> Self {
        self.generator = Some(generator);
        self.message_timeout = timeout;
        self
    }

    /// Abort the session at the next round boundary when this token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle for aborting this session from elsewhere
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get current state
    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    /// Offers exchanged so far
    pub fn history(&self) -> &[Offer] {
        &self.history
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Final outcome, once the session has terminated
    pub fn outcome(&self) -> Option<&NegotiationOutcome> {
        self.outcome.as_ref()
    }

    /// Leave Init and hand the first turn to the configured proposer
    pub fn start(&mut self) -> Result<()> {
        if self.state != NegotiationState::Init {
            return Err(HaggleError::InvalidStateTransition(
                "Session already started".to_string(),
            ));
        }

        self.round = 0;
        self.to_move = self.config.first_proposer;
        self.state = NegotiationState::InProgress {
            round: 0,
            to_move: self.to_move,
        };

        tracing::info!(
            "Negotiation started for {} ({} rounds, {} moves first)",
            self.product.name(),
            self.config.max_rounds,
            self.to_move
        );
        Ok(())
    }

    /// Play one turn. Returns the state after the turn.
    pub async fn step(&mut self) -> Result<&NegotiationState> {
        if !self.state.is_active() {
            return Err(HaggleError::InvalidStateTransition(format!(
                "Cannot take a turn in state {:?}",
                self.state
            )));
        }

        if self.cancel.is_cancelled() {
            tracing::info!("Negotiation aborted at round {}", self.round);
            self.finish_exhausted();
            return Ok(&self.state);
        }

        if let Some(price) = self.crossing_price() {
            tracing::info!("Offers crossed at round {}, settling at midpoint {}", self.round, price);
            self.finish_deal(price);
            return Ok(&self.state);
        }

        if self.round >= self.config.max_rounds {
            self.finish_exhausted();
            return Ok(&self.state);
        }

        let party = self.to_move;
        let next = {
            let view = NegotiationView {
                product: &self.product,
                history: &self.history,
                round: self.round,
                max_rounds: self.config.max_rounds,
            };
            self.agent(party).next_move(&view)
        };

        match next {
            Move::Accept { .. } => match self.acceptable_price(party) {
                Ok(price) => {
                    tracing::info!("{} accepted {} at round {}", party, price, self.round);
                    self.finish_deal(price);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.finish_rejected(e.to_string());
                }
            },
            Move::Reject { reason } => {
                tracing::info!("{} walked away at round {}: {}", party, self.round, reason);
                self.finish_rejected(format!("{} rejected: {}", party, reason));
            }
            Move::Counter { price, message } => {
                if let Err(e) = self.check_counter(party, price) {
                    tracing::warn!("{}", e);
                    self.finish_rejected(e.to_string());
                    return Ok(&self.state);
                }

                let message = self.decorate(party, price, message).await;
                tracing::debug!("Round {}: {} offers {}", self.round, party, price);

                self.history.push(Offer {
                    round: self.round,
                    proposer: party,
                    price,
                    message,
                });
                self.round += 1;
                self.to_move = party.opponent();
                self.state = NegotiationState::InProgress {
                    round: self.round,
                    to_move: self.to_move,
                };
            }
        }

        Ok(&self.state)
    }

    /// Run to termination and return the outcome
    pub async fn run(&mut self) -> Result<NegotiationOutcome> {
        if self.state == NegotiationState::Init {
            self.start()?;
        }

        while self.state.is_active() {
            self.step().await?;
        }

        self.outcome
            .clone()
            .ok_or_else(|| HaggleError::Internal("terminal state without outcome".to_string()))
    }

    fn agent(&self, party: Party) -> &dyn NegotiationAgent {
        match party {
            Party::Buyer => self.buyer.as_ref(),
            Party::Seller => self.seller.as_ref(),
        }
    }

    fn last_price(&self, party: Party) -> Option<Decimal> {
        self.history
            .iter()
            .rev()
            .find(|o| o.proposer == party)
            .map(|o| o.price)
    }

    /// Midpoint of the standing offers when the buyer bids at or above the ask
    fn crossing_price(&self) -> Option<Decimal> {
        let bid = self.last_price(Party::Buyer)?;
        let ask = self.last_price(Party::Seller)?;
        if bid >= ask {
            Some((bid / Decimal::TWO + ask / Decimal::TWO).normalize())
        } else {
            None
        }
    }

    fn check_counter(&self, party: Party, price: Decimal) -> Result<()> {
        if price <= Decimal::ZERO {
            return Err(HaggleError::invalid_offer(
                party,
                format!("non-positive price {}", price),
            ));
        }

        let limit = self.agent(party).price_limit();
        if !limit.permits(price) {
            return Err(HaggleError::invalid_offer(
                party,
                format!("price {} outside own {}", price, limit),
            ));
        }

        if let Some(last) = self.last_price(party) {
            let retreat = match party {
                Party::Buyer => price < last,
                Party::Seller => price > last,
            };
            if retreat {
                return Err(HaggleError::invalid_offer(
                    party,
                    format!("price {} retreats from previous offer {}", price, last),
                ));
            }
        }

        Ok(())
    }

    fn acceptable_price(&self, party: Party) -> Result<Decimal> {
        let price = self.last_price(party.opponent()).ok_or_else(|| {
            HaggleError::invalid_offer(party, "accepted before any opposing offer")
        })?;

        let limit = self.agent(party).price_limit();
        if !limit.permits(price) {
            return Err(HaggleError::invalid_offer(
                party,
                format!("accepted {} outside own {}", price, limit),
            ));
        }
        Ok(price)
    }

    async fn decorate(&self, party: Party, price: Decimal, fallback: Option<String>) -> Option<String> {
        let Some(generator) = self.generator.as_deref() else {
            return fallback;
        };

        let request = MessageRequest {
            product: &self.product,
            history: &self.history,
            party,
            persona: self.agent(party).persona(),
            price,
        };

        match generate_with_timeout(generator, request, self.message_timeout).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Message service failed for {}, using agent message: {}", party, e);
                fallback
            }
        }
    }

    fn finish_deal(&mut self, price: Decimal) {
        self.state = NegotiationState::DealAccepted { price };
        self.record(NegotiationOutcome::deal(
            price,
            self.round,
            self.product.market_price(),
            self.history.clone(),
        ));
    }

    fn finish_rejected(&mut self, reason: String) {
        self.state = NegotiationState::DealRejected {
            reason: reason.clone(),
        };
        self.record(NegotiationOutcome::no_deal(
            Termination::Reject,
            self.round,
            self.product.market_price(),
            Some(reason),
            self.history.clone(),
        ));
    }

    fn finish_exhausted(&mut self) {
        self.state = NegotiationState::RoundsExhausted;
        self.record(NegotiationOutcome::no_deal(
            Termination::MaxRounds,
            self.round,
            self.product.market_price(),
            None,
            self.history.clone(),
        ));
    }

    fn record(&mut self, outcome: NegotiationOutcome) {
        if self.outcome.is_some() {
            return;
        }
        tracing::info!(
            "Negotiation for {} ended: {} after {} rounds (final price {:?}, savings {})",
            self.product.name(),
            outcome.terminated_by(),
            outcome.rounds_used(),
            outcome.final_price(),
            outcome.savings()
        );
        self.outcome = Some(outcome);
    }
}
