//! Carry-forward baseline used by `dayloop` and `backtest`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solera_traits::{PredictionContext, PredictionVector, Predictor, Result, TargetIndex};
use std::f64::consts::PI;

/// Standard deviation of the tie-breaking jitter.
pub(crate) const JITTER_STD: f64 = 1e-6;

/// Predicts each target as its most recently released label.
///
/// Targets never released predict 0.0. A tiny normal jitter breaks ties so
/// that flat days still rank.
pub(crate) struct CarryForward {
    rng: StdRng,
    jitter_std: f64,
}

impl CarryForward {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            jitter_std: JITTER_STD,
        }
    }

    pub(crate) const fn with_jitter(mut self, jitter_std: f64) -> Self {
        self.jitter_std = jitter_std;
        self
    }

    /// Standard normal draw (Box-Muller).
    fn normal(&mut self) -> f64 {
        // u1 in (0, 1] keeps the log finite
        let u1 = 1.0 - self.rng.gen_range(0.0..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        (-2.0 * f64::ln(u1)).sqrt() * (2.0 * PI * u2).cos()
    }

    fn last_known(ctx: &PredictionContext<'_>, target: TargetIndex) -> f64 {
        ctx.lagged
            .iter()
            .filter_map(|row| row.values.get(target))
            .find(|v| v.is_finite())
            .or_else(|| ctx.history.latest(target).map(|(_, v)| v))
            .unwrap_or(0.0)
    }
}

impl Predictor for CarryForward {
    fn name(&self) -> &str {
        "carry_forward"
    }

    fn predict(&mut self, ctx: &PredictionContext<'_>) -> Result<PredictionVector> {
        let mut prediction = PredictionVector::new();
        for &target in ctx.expected {
            let jitter = self.jitter_std * self.normal();
            prediction.insert(target, Self::last_known(ctx, target) + jitter);
        }
        Ok(prediction)
    }
}
