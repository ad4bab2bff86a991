use std::time::Duration;

use crate::core::{
    domain::{ExecutionResult, TestInput},
    errors::SpawnError,
    traits::runner::Runner,
};

/// Runner that never spawns anything and answers every call with a canned
/// outcome after `delay`.
#[derive(Debug, Clone)]
pub struct RunnerStub {
    result: Result<ExecutionResult, String>,
    delay: Duration,
    present: bool,
}

impl RunnerStub {
    pub fn new(result: ExecutionResult, delay: Duration) -> Self {
        Self {
            result: Ok(result),
            delay,
            present: true,
        }
    }

    /// Every call fails with a [`SpawnError::Spawn`] carrying `msg`.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            result: Err(msg.into()),
            delay: Duration::ZERO,
            present: true,
        }
    }

    /// Pretends the executable has disappeared from disk.
    pub fn missing(self) -> Self {
        Self {
            present: false,
            ..self
        }
    }
}

#[async_trait::async_trait]
impl Runner for RunnerStub {
    #[tracing::instrument]
    async fn run(&self, input: &TestInput) -> Result<ExecutionResult, SpawnError> {
        tracing::debug!("Start execution: input={:?}", input);
        tokio::time::sleep(self.delay).await;
        tracing::debug!("Execution result: {:?}", self.result);

        self.result.clone().map_err(|msg| SpawnError::Spawn {
            program: "stub".to_string(),
            source: std::io::Error::other(msg),
        })
    }

    fn executable_exists(&self) -> bool {
        self.present
    }
}
