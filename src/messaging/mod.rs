//! Optional message decoration for offers
//!
//! A [`MessageGenerator`] turns a priced move into natural-language text.
//! It never influences prices: the session calls it after the agent has
//! decided, bounds the call with a timeout and keeps the agent's own
//! message when the service fails.

pub mod http;

pub use http::{HttpMessageGenerator, LlmConfig};

use futures::future::BoxFuture;
use futures::FutureExt;
use rust_decimal::Decimal;
use std::time::Duration;

use crate::agent::Persona;
use crate::error::{HaggleError, Result};
use crate::negotiation::Offer;
use crate::types::{Party, Product};

/// Default bound on a single generator call
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a generator may see. Private agent limits are not included.
#[derive(Clone, Copy, Debug)]
pub struct MessageRequest<'a> {
    pub product: &'a Product,
    pub history: &'a [Offer],
    pub party: Party,
    pub persona: &'a Persona,
    pub price: Decimal,
}

/// External message-generation service
pub trait MessageGenerator: Send + Sync {
    fn generate_message<'a>(&'a self, request: MessageRequest<'a>) -> BoxFuture<'a, Result<String>>;
}

/// Deterministic generator built from the persona, no I/O
#[derive(Clone, Debug, Default)]
pub struct TemplateMessageGenerator;

impl MessageGenerator for TemplateMessageGenerator {
    fn generate_message<'a>(&'a self, request: MessageRequest<'a>) -> BoxFuture<'a, Result<String>> {
        let turn = request
            .history
            .iter()
            .filter(|o| o.proposer == request.party)
            .count();
        let text = format!(
            "[{}] {} for the {}. {}",
            request.persona.name,
            request.price,
            request.product.name(),
            request.persona.catchphrase(turn)
        );
        async move { Ok::<_, HaggleError>(text) }.boxed()
    }
}

/// Run a generator under a timeout
pub async fn generate_with_timeout(
    generator: &dyn MessageGenerator,
    request: MessageRequest<'_>,
    timeout: Duration,
) -> Result<String> {
    match tokio::time::timeout(timeout, generator.generate_message(request)).await {
        Ok(result) => result,
        Err(_) => Err(HaggleError::ServiceTimeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QualityGrade;
    use rust_decimal_macros::dec;

    struct SlowGenerator(Duration);

    impl MessageGenerator for SlowGenerator {
        fn generate_message<'a>(&'a self, _request: MessageRequest<'a>) -> BoxFuture<'a, Result<String>> {
            let delay = self.0;
            async move {
                tokio::time::sleep(delay).await;
                Ok::<_, HaggleError>("too late".to_string())
            }
            .boxed()
        }
    }

    fn persona() -> Persona {
        Persona {
            name: "Tester".to_string(),
            style: "plain".to_string(),
            catchphrases: vec!["Fair enough.".to_string()],
        }
    }

    #[test]
    fn test_template_generator() {
        let product = Product::new("Cardamom", "spice", 5, QualityGrade::A, "Idukki", dec!(100)).unwrap();
        let persona = persona();
        let request = MessageRequest {
            product: &product,
            history: &[],
            party: Party::Buyer,
            persona: &persona,
            price: dec!(72.5),
        };

        let text = tokio_test::block_on(TemplateMessageGenerator.generate_message(request)).unwrap();
        assert_eq!(text, "[Tester] 72.5 for the Cardamom. Fair enough.");
    }

    #[tokio::test]
    async fn test_timeout_bounds_slow_generator() {
        let product = Product::new("Cardamom", "spice", 5, QualityGrade::A, "Idukki", dec!(100)).unwrap();
        let persona = persona();
        let request = MessageRequest {
            product: &product,
            history: &[],
            party: Party::Seller,
            persona: &persona,
            price: dec!(110),
        };

        let slow = SlowGenerator(Duration::from_secs(30));
        let result = generate_with_timeout(&slow, request, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(HaggleError::ServiceTimeout(_))));

        let fast = SlowGenerator(Duration::from_millis(1));
        let result = generate_with_timeout(&fast, request, Duration::from_secs(5)).await;
        assert_eq!(result.unwrap(), "too late");
    }
}
