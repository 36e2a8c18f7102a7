//! Negotiation engine runs batches of independent sessions

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::session::NegotiationSession;
use super::types::NegotiationOutcome;
use crate::error::{HaggleError, Result};
use crate::messaging::{MessageGenerator, DEFAULT_MESSAGE_TIMEOUT};
use crate::scenario::Scenario;

/// Result of one scenario run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub product: String,
    pub outcome: NegotiationOutcome,
}

/// Runs sessions; each session owns its product, agents and history
pub struct NegotiationEngine {
    generator: Option<Arc<dyn MessageGenerator>>,
    message_timeout: Duration,
    shutdown: CancellationToken,
}

impl NegotiationEngine {
    /// Create new negotiation engine
    pub fn new() -> Self {
        Self {
            generator: None,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    /// Share one message generator across all sessions
    pub fn with_message_generator(mut self, generator: Arc<dyn MessageGenerator>, timeout: Duration) -> Self {
        self.generator = Some(generator);
        self.message_timeout = timeout;
        self
    }

    /// Cancelling this token aborts every running session at its next round boundary
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Build a session for a scenario with the engine's collaborators attached
    pub fn prepare(&self, scenario: &Scenario) -> Result<NegotiationSession> {
        let mut session = scenario
            .build_session()?
            .with_cancellation(self.shutdown.child_token());

        if let Some(generator) = &self.generator {
            session = session.with_message_generator(generator.clone(), self.message_timeout);
        }
        Ok(session)
    }

    /// Run a single scenario to completion
    pub async fn run_scenario(&self, scenario: &Scenario) -> Result<ScenarioReport> {
        let mut session = self.prepare(scenario)?;
        let outcome = session.run().await?;

        Ok(ScenarioReport {
            name: scenario.name.clone(),
            product: scenario.product.name.clone(),
            outcome,
        })
    }

    /// Run scenarios in parallel, one task each. Reports come back in input order.
    ///
    /// Every session is built before any is spawned, so a configuration error
    /// fails the whole batch without running anything.
    pub async fn run_all(&self, scenarios: &[Scenario]) -> Result<Vec<ScenarioReport>> {
        let mut sessions = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let session = self.prepare(scenario).map_err(|e| match e {
                HaggleError::Configuration { field, reason } => HaggleError::Configuration {
                    field: format!("{}: {}", scenario.name, field),
                    reason,
                },
                other => other,
            })?;
            sessions.push(session);
        }

        tracing::info!("Running {} negotiation sessions", sessions.len());

        let handles = sessions.into_iter().map(|mut session| {
            tokio::spawn(async move { session.run().await })
        });
        let joined = futures::future::join_all(handles).await;

        let mut reports = Vec::with_capacity(scenarios.len());
        for (scenario, result) in scenarios.iter().zip(joined) {
            let outcome = result
                .map_err(|e| HaggleError::Internal(format!("session task failed: {}", e)))??;
            reports.push(ScenarioReport {
                name: scenario.name.clone(),
                product: scenario.product.name.clone(),
                outcome,
            });
        }

        Ok(reports)
    }
}

impl Default for NegotiationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::TemplateMessageGenerator;
    use crate::negotiation::Termination;

    fn scenario(name: &str, ceiling: u32, floor: u32) -> Scenario {
        let text = format!(
            r#"{{
                "name": "{}",
                "product": {{"name": "Cashews", "quantity": 10, "quality": "B", "market_price": 100}},
                "buyer": {{"budget_ceiling": {}, "target_price": 40, "concession_rate": 0.2}},
                "seller": {{"start_price": 120, "floor_price": {}, "concession_rate": 0.15}}
            }}"#,
            name, ceiling, floor
        );
        Scenario::from_json(&text).unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = NegotiationEngine::new();
        assert!(engine.generator.is_none());
        assert!(!engine.shutdown_handle().is_cancelled());
    }

    #[tokio::test]
    async fn test_run_scenario() {
        let engine = NegotiationEngine::new();
        let report = engine.run_scenario(&scenario("open", 90, 80)).await.unwrap();

        assert_eq!(report.name, "open");
        assert_eq!(report.product, "Cashews");
        assert!(report.outcome.deal_reached());
    }

    #[tokio::test]
    async fn test_run_all_keeps_input_order() {
        let engine = NegotiationEngine::new();
        let scenarios = vec![
            scenario("deal", 90, 80),
            scenario("no-deal", 50, 80),
            scenario("deal-again", 95, 70),
        ];

        let reports = engine.run_all(&scenarios).await.unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["deal", "no-deal", "deal-again"]);
        assert!(reports[0].outcome.deal_reached());
        assert_eq!(reports[1].outcome.terminated_by(), Termination::MaxRounds);
        assert!(reports[2].outcome.deal_reached());
    }

    #[tokio::test]
    async fn test_parallel_runs_match_sequential_runs() {
        let engine = NegotiationEngine::new()
            .with_message_generator(Arc::new(TemplateMessageGenerator), Duration::from_secs(1));
        let scenarios: Vec<Scenario> = (0..8).map(|i| scenario(&format!("s{}", i), 85 + i, 75)).collect();

        let parallel = engine.run_all(&scenarios).await.unwrap();
        for (scenario, report) in scenarios.iter().zip(&parallel) {
            let sequential = engine.run_scenario(scenario).await.unwrap();
            assert_eq!(&sequential, report);
        }
    }

    #[tokio::test]
    async fn test_shutdown_aborts_sessions() {
        let engine = NegotiationEngine::new();
        engine.shutdown_handle().cancel();

        let reports = engine.run_all(&[scenario("aborted", 90, 80)]).await.unwrap();
        let outcome = &reports[0].outcome;
        assert!(!outcome.deal_reached());
        assert_eq!(outcome.terminated_by(), Termination::MaxRounds);
        assert_eq!(outcome.rounds_used(), 0);
    }
}
