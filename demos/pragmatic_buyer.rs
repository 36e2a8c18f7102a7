//! Step through one negotiation by hand and print every turn.
//!
//! cargo run --example pragmatic_buyer

use std::sync::Arc;
use std::time::Duration;

use haggle::{
    BuyerAgent, BuyerConfig, NegotiationSession, NegotiationState, Personality, Product,
    QualityGrade, SellerAgent, SellerConfig, SessionConfig, TemplateMessageGenerator,
};
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let product = Product::new(
        "Green Cardamom",
        "spice",
        25,
        QualityGrade::A,
        "Guatemala",
        dec!(100),
    )?;

    let buyer = BuyerAgent::new(BuyerConfig::new(dec!(90), dec!(70), dec!(0.2)))?;
    let seller = SellerAgent::new(
        SellerConfig::new(dec!(120), dec!(80), dec!(0.15)).with_personality(Personality::Aggressive),
    )?;

    let mut session = NegotiationSession::new(
        product,
        Box::new(buyer),
        Box::new(seller),
        SessionConfig::default(),
    )?
    .with_message_generator(Arc::new(TemplateMessageGenerator), Duration::from_secs(1));

    session.start()?;
    let mut printed = 0;
    while session.state().is_active() {
        let state = session.step().await?.clone();
        for offer in &session.history()[printed..] {
            println!(
                "round {:>2} {:<6} {:>8}  {}",
                offer.round,
                offer.proposer,
                offer.price,
                offer.message.as_deref().unwrap_or("")
            );
        }
        printed = session.history().len();
        match state {
            NegotiationState::DealAccepted { price } => println!("deal at {}", price),
            NegotiationState::DealRejected { reason } => println!("rejected: {}", reason),
            NegotiationState::RoundsExhausted => println!("out of rounds"),
            _ => {}
        }
    }

    if let Some(outcome) = session.outcome() {
        match outcome.savings_pct() {
            Some(pct) => println!("savings {} ({}% of market)", outcome.savings(), pct.round_dp(2)),
            None => println!("savings {}", outcome.savings()),
        }
        println!("transcript {}", outcome.transcript_hash());
    }

    Ok(())
}
