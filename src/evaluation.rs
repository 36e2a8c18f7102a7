//! Aggregate scoring over finished negotiations

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::error::{HaggleError, Result};
use crate::negotiation::NegotiationOutcome;

/// Summary metrics for a set of outcomes
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub sessions: usize,
    pub deals: usize,
    /// Fraction of sessions that reached a deal
    pub success_rate: Decimal,
    /// Mean savings across all sessions; sessions without a deal count as zero
    pub mean_savings: Decimal,
    /// Mean of savings / market price, in percent
    pub mean_savings_pct: Decimal,
    pub mean_rounds: Decimal,
    pub median_rounds: Decimal,
}

/// Stateless scorer
pub struct Evaluator;

impl Evaluator {
    /// Score a set of outcomes. An empty set scores all zeros.
    ///
    /// Fails with [`HaggleError::Overflow`] when totals leave `Decimal` range.
    pub fn evaluate<'a, I>(outcomes: I) -> Result<Evaluation>
    where
        I: IntoIterator<Item = &'a NegotiationOutcome>,
    {
        let outcomes: Vec<&NegotiationOutcome> = outcomes.into_iter().collect();
        if outcomes.is_empty() {
            return Ok(Evaluation::default());
        }

        let sessions = outcomes.len();
        let count = Decimal::from(sessions as u64);
        let deals = outcomes.iter().filter(|o| o.deal_reached()).count();

        let mut total_savings = Decimal::ZERO;
        let mut total_pct = Decimal::ZERO;
        for outcome in &outcomes {
            total_savings = total_savings
                .checked_add(outcome.savings())
                .ok_or_else(|| HaggleError::Overflow("total savings".to_string()))?;
            let pct = outcome
                .savings_pct()
                .ok_or_else(|| HaggleError::Overflow("savings percentage".to_string()))?;
            total_pct = total_pct
                .checked_add(pct)
                .ok_or_else(|| HaggleError::Overflow("total savings percentage".to_string()))?;
        }

        let mut rounds: Vec<u32> = outcomes.iter().map(|o| o.rounds_used()).collect();
        rounds.sort_unstable();
        let total_rounds: u64 = rounds.iter().map(|&r| u64::from(r)).sum();

        Ok(Evaluation {
            sessions,
            deals,
            success_rate: Decimal::from(deals as u64) / count,
            mean_savings: total_savings / count,
            mean_savings_pct: total_pct / count,
            mean_rounds: Decimal::from(total_rounds) / count,
            median_rounds: median(&rounds),
        })
    }
}

fn median(sorted: &[u32]) -> Decimal {
    match sorted.len() {
        0 => Decimal::ZERO,
        n if n % 2 == 1 => Decimal::from(sorted[n / 2]),
        n => (Decimal::from(sorted[n / 2 - 1]) + Decimal::from(sorted[n / 2])) / Decimal::TWO,
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sessions:       {}", self.sessions)?;
        writeln!(
            f,
            "Deals:          {} ({}%)",
            self.deals,
            (self.success_rate * Decimal::ONE_HUNDRED).round_dp(1)
        )?;
        writeln!(
            f,
            "Mean savings:   {} ({}% of market)",
            self.mean_savings.round_dp(2),
            self.mean_savings_pct.round_dp(2)
        )?;
        write!(
            f,
            "Rounds:         mean {}, median {}",
            self.mean_rounds.round_dp(2),
            self.median_rounds
        )
    }
}
