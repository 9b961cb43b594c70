// CLI argument parsing. One binary, two worker roles.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "worker-listener",
    version,
    about = "Resilient job workers for the workflow orchestrator"
)]
pub struct CommandSettings {
    #[command(subcommand)]
    command: Option<WorkerRole>,
}

/// Which worker this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum WorkerRole {
    /// Run the credit-score lookup worker (default).
    CreditScore,
    /// Run the message-forwarding worker.
    ForwardMessages,
}

impl CommandSettings {
    pub fn role(&self) -> WorkerRole {
        self.command.unwrap_or(WorkerRole::CreditScore)
    }
}
