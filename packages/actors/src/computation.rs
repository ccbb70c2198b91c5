//! Pluggable computation run for every accepted work item.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rand::Rng;
use relay_core::ProcessingInput;

/// Result type for computations: the computed value or a failure description.
pub type ComputationResult = Result<i64, String>;

/// Future type for async computations.
pub type ComputationFuture = Pin<Box<dyn Future<Output = ComputationResult> + Send>>;

/// Trait for the business computation behind the engine.
///
/// The engine may abandon a returned future's result (on terminate) but never
/// polls it to cancellation; implementations should not rely on being dropped early.
pub trait Computation: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Start computing the value for an input.
    fn run(&self, input: &ProcessingInput) -> ComputationFuture;
}

/// Stand-in for the long business computation: waits a fixed delay, then
/// draws a value in `0..=max_value`.
#[derive(Debug, Clone)]
pub struct DelayedDraw {
    delay: Duration,
    max_value: i64,
}

impl DelayedDraw {
    /// Default upper bound of the drawn value.
    pub const MAX_VALUE: i64 = 50;

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_value: Self::MAX_VALUE,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Computation for DelayedDraw {
    fn name(&self) -> &str {
        "delayed-draw"
    }

    fn run(&self, input: &ProcessingInput) -> ComputationFuture {
        let delay = self.delay;
        let max_value = self.max_value;
        let id = input.id.clone();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            let value = rand::thread_rng().gen_range(0..=max_value);
            tracing::debug!("Computed {} for {}", value, id);
            Ok(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delayed_draw_stays_in_range() {
        let draw = DelayedDraw::new(Duration::from_millis(1));
        let input = ProcessingInput::new("x", "n", "s", 1);
        for _ in 0..20 {
            let value = draw.run(&input).await.unwrap();
            assert!((0..=DelayedDraw::MAX_VALUE).contains(&value));
        }
    }
}
