//! Haggle application wiring scenarios, engine and reporting

use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::commands::LlmArgs;
use crate::error::Result;
use crate::evaluation::{Evaluation, Evaluator};
use crate::messaging::{HttpMessageGenerator, LlmConfig};
use crate::negotiation::{NegotiationEngine, ScenarioReport};
use crate::scenario::Scenario;
use crate::sweep;

/// Everything printed for one invocation
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub scenarios: Vec<ScenarioReport>,
    pub evaluation: Evaluation,
}

impl BatchReport {
    pub fn new(scenarios: Vec<ScenarioReport>) -> Result<Self> {
        let evaluation = Evaluator::evaluate(scenarios.iter().map(|r| &r.outcome))?;
        Ok(Self {
            scenarios,
            evaluation,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text report. `with_history` prints every offer.
    pub fn render_text(&self, with_history: bool) -> String {
        let mut out = String::new();

        for report in &self.scenarios {
            let outcome = &report.outcome;
            let _ = writeln!(out, "== {} ({}) ==", report.name, report.product);

            if with_history {
                for offer in outcome.history() {
                    let _ = writeln!(
                        out,
                        "  {:>3}  {:<6}  {:>10}  {}",
                        offer.round,
                        offer.proposer,
                        offer.price,
                        offer.message.as_deref().unwrap_or("")
                    );
                }
            }

            match outcome.final_price() {
                Some(price) => {
                    let _ = writeln!(
                        out,
                        "Outcome: {} at {} after {} rounds (savings {})",
                        outcome.terminated_by(),
                        price,
                        outcome.rounds_used(),
                        outcome.savings()
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "Outcome: {} without a deal after {} rounds{}",
                        outcome.terminated_by(),
                        outcome.rounds_used(),
                        outcome
                            .rejection_reason()
                            .map(|r| format!(" ({})", r))
                            .unwrap_or_default()
                    );
                }
            }
            if with_history {
                let _ = writeln!(out, "Transcript: {}", outcome.transcript_hash());
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{}", self.evaluation);
        out
    }
}

/// Main haggle application
pub struct HaggleApp {
    engine: NegotiationEngine,
}

impl HaggleApp {
    /// Create an app; a message service is attached when a URL is given
    pub fn new(llm: Option<&LlmArgs>) -> Result<Self> {
        let mut engine = NegotiationEngine::new();

        if let Some(args) = llm {
            if let Some(url) = &args.llm_url {
                let timeout = Duration::from_millis(args.timeout_ms);
                let config = LlmConfig::new(url.clone(), args.llm_model.clone())
                    .with_env_api_key()
                    .with_request_timeout(timeout);
                let generator = HttpMessageGenerator::new(config)?;
                tracing::info!("Decorating offers via {} ({})", url, args.llm_model);
                engine = engine.with_message_generator(Arc::new(generator), timeout);
            }
        }

        Ok(Self { engine })
    }

    pub fn engine(&self) -> &NegotiationEngine {
        &self.engine
    }

    /// Abort running sessions on Ctrl+C; they finish as rounds exhausted
    pub fn abort_on_ctrl_c(&self) {
        let shutdown = self.engine.shutdown_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, aborting sessions at the next round");
                shutdown.cancel();
            }
        });
    }

    /// Load and run scenario files
    pub async fn run_files(&self, paths: &[PathBuf]) -> Result<BatchReport> {
        let scenarios = paths
            .iter()
            .map(Scenario::load)
            .collect::<Result<Vec<_>>>()?;

        let reports = self.engine.run_all(&scenarios).await?;
        BatchReport::new(reports)
    }

    /// Run seeded variants of a base scenario
    pub async fn sweep(&self, path: &Path, count: usize, seed: u64) -> Result<BatchReport> {
        let base = Scenario::load(path)?;
        let variants = sweep::perturb(&base, count, seed);
        tracing::info!("Sweeping {} variants of {} (seed {})", count, base.name, seed);

        let reports = self.engine.run_all(&variants).await?;
        BatchReport::new(reports)
    }
}
