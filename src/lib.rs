//! haggle: round-limited buyer/seller negotiation
//!
//! A buyer agent and a mock seller agent exchange offers over a bounded
//! number of rounds until one side accepts, one side walks away, or the
//! rounds run out. Outcomes are scored for deal success and savings.
//!
//! - [`agent`]: the [`NegotiationAgent`] trait with buyer and seller strategies
//! - [`negotiation`]: the session state machine and a parallel batch engine
//! - [`messaging`]: optional, timeout-bounded offer message decoration
//! - [`evaluation`]: aggregate metrics over outcomes
//! - [`scenario`]: JSON scenario files

pub mod agent;
pub mod cli;
pub mod error;
pub mod evaluation;
pub mod messaging;
pub mod negotiation;
pub mod scenario;
pub mod sweep;
pub mod types;

// Re-export commonly used types
pub use agent::{
    BuyerAgent, BuyerConfig, Move, NegotiationAgent, NegotiationView, Persona, Personality,
    PriceLimit, SellerAgent, SellerConfig,
};
pub use error::{HaggleError, Result};
pub use evaluation::{Evaluation, Evaluator};
pub use messaging::{MessageGenerator, MessageRequest, TemplateMessageGenerator};
pub use negotiation::{
    NegotiationEngine, NegotiationOutcome, NegotiationSession, NegotiationState, Offer,
    ScenarioReport, SessionConfig, Termination,
};
pub use scenario::Scenario;
pub use types::{Party, Product, QualityGrade, TranscriptHash};
