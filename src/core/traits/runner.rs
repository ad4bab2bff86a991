use crate::core::{
    domain::{ExecutionResult, TestInput},
    errors::SpawnError,
};

#[mockall::automock]
#[async_trait::async_trait]
pub trait Runner: std::fmt::Debug + Send + Sync {
    async fn run(&self, input: &TestInput) -> Result<ExecutionResult, SpawnError>;

    /// Whether the program under test is still present on disk.
    fn executable_exists(&self) -> bool;
}
