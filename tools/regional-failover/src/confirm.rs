use async_trait::async_trait;
use inquire::Select;

use crate::error::{FailoverError, Result};

const YES: &str = "Yes";
const NO: &str = "No";

#[async_trait]
pub trait Confirm: Send + Sync {
    /// `Ok(true)` only for an explicit yes. Prompt failures are errors, never answers.
    async fn confirm(&self, prompt: &str) -> Result<bool>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InteractiveConfirm;

#[async_trait]
impl Confirm for InteractiveConfirm {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        let prompt = prompt.to_string();

        // inquire blocks on terminal input, keep it off the runtime's worker thread
        answer_off_runtime(move || {
            let answer = Select::new(&prompt, vec![YES, NO])
                .with_help_message("Use arrow keys to choose, enter to select")
                .prompt()
                .map_err(|e| FailoverError::Prompt(e.to_string()))?;

            Ok(is_affirmative(answer))
        })
        .await
    }
}

async fn answer_off_runtime<F>(ask: F) -> Result<bool>
where
    F: FnOnce() -> Result<bool> + Send + 'static,
{
    tokio::task::spawn_blocking(ask)
        .await
        .map_err(|e| FailoverError::Prompt(e.to_string()))?
}

pub fn is_affirmative(answer: &str) -> bool {
    answer == YES
}

pub fn production_prompt(command: &str) -> String {
    format!(
        "You are about to run a {} failover of production. Continue? [Yes/No]",
        command
    )
}
