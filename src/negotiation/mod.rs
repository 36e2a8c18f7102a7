//! Turn-based bilateral negotiation

pub mod engine;
pub mod session;
pub mod types;

pub use engine::{NegotiationEngine, ScenarioReport};
pub use session::NegotiationSession;
pub use types::{
    transcript_hash, NegotiationOutcome, NegotiationState, Offer, SessionConfig, Termination,
    DEFAULT_MAX_ROUNDS,
};
