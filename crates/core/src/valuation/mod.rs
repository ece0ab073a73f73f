pub mod benchmark;
pub mod engine;

use crate::domain::stock::{ScoredSnapshot, TickerSnapshot};
use crate::domain::userprofile::UserProfile;
use benchmark::BenchmarkYieldCache;
use engine::PaymentSchedule;
use std::sync::Arc;

/// The valuation engine bound to a shared benchmark cache.
#[derive(Clone)]
pub struct ValuationService {
    benchmark: Arc<BenchmarkYieldCache>,
    schedule: PaymentSchedule,
}

impl ValuationService {
    pub fn new(benchmark: Arc<BenchmarkYieldCache>, schedule: PaymentSchedule) -> Self {
        Self {
            benchmark,
            schedule,
        }
    }

    pub async fn calculate(
        &self,
        snapshot: &TickerSnapshot,
        expected_raise: f64,
        expected_return: f64,
    ) -> ScoredSnapshot {
        let benchmark_yield = self.benchmark.get().await;
        engine::score_with_schedule(
            snapshot,
            expected_raise,
            expected_return,
            benchmark_yield,
            &self.schedule,
        )
    }

    pub async fn calculate_for_profile(
        &self,
        snapshot: &TickerSnapshot,
        profile: &UserProfile,
    ) -> ScoredSnapshot {
        let expectation = profile.resolve(&snapshot.ticker);
        tracing::debug!(
            symbol = %snapshot.ticker,
            expected_raise = expectation.expected_raise,
            expected_return = expectation.expected_return,
            "scoring ticker"
        );
        self.calculate(
            snapshot,
            expectation.expected_raise,
            expectation.expected_return,
        )
        .await
    }

    /// Scores every snapshot; one benchmark lookup serves the whole slate.
    pub async fn calculate_all(
        &self,
        snapshots: &[TickerSnapshot],
        profile: &UserProfile,
    ) -> Vec<ScoredSnapshot> {
        let benchmark_yield = self.benchmark.get().await;
        snapshots
            .iter()
            .map(|snapshot| {
                let expectation = profile.resolve(&snapshot.ticker);
                engine::score_with_schedule(
                    snapshot,
                    expectation.expected_raise,
                    expectation.expected_return,
                    benchmark_yield,
                    &self.schedule,
                )
            })
            .collect()
    }
}
