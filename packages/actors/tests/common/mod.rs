#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use actors::{Computation, ComputationFuture, DelayedDraw, EngineArgs, WorkEngine, start_engine};
use relay_core::ProcessingInput;

/// Delay used by the fast stand-in computation.
pub const FAST: Duration = Duration::from_millis(150);

/// Start an engine running `DelayedDraw` with the given delay.
pub async fn engine_with_delay(delay: Duration) -> Result<WorkEngine, Box<dyn Error>> {
    engine_with(EngineArgs::new(Arc::new(DelayedDraw::new(delay)))).await
}

/// Start an engine from explicit arguments.
pub async fn engine_with(args: EngineArgs) -> Result<WorkEngine, Box<dyn Error>> {
    let (engine, _handle) = start_engine(args).await?;
    Ok(engine)
}

/// Start an engine running the given computation.
pub async fn engine_running(
    computation: impl Computation,
) -> Result<WorkEngine, Box<dyn Error>> {
    engine_with(EngineArgs::new(Arc::new(computation))).await
}

/// Fails for anyone under 18, otherwise computes the age.
pub struct RejectMinors;

impl Computation for RejectMinors {
    fn name(&self) -> &str {
        "reject-minors"
    }

    fn run(&self, input: &ProcessingInput) -> ComputationFuture {
        let outcome = if input.age < 18 {
            Err(format!("{} is too young", input.name))
        } else {
            Ok(input.age)
        };
        Box::pin(async move { outcome })
    }
}

pub fn input(id: &str) -> ProcessingInput {
    ProcessingInput::new(id, "Ada", "Lovelace", 36)
}

/// Give spawned tasks and the actor mailbox a moment to settle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
