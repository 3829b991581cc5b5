//! Operator confirmation for destructive actions

use async_trait::async_trait;
use std::io::{BufRead, Write};

/// Asks the operator a yes/no question
#[async_trait]
pub trait Confirmation: Send + Sync {
    /// `true` only on an explicit yes
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Always answers the same way (`--yes`, scripted use)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirmation for FixedAnswer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Prompts on stdout and reads the answer from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout().lock();
            if write!(stdout, "{prompt} [y/N] ").and_then(|()| stdout.flush()).is_err() {
                return false;
            }
            let mut answer = String::new();
            if std::io::stdin().lock().read_line(&mut answer).is_err() {
                return false;
            }
            is_yes(&answer)
        })
        .await
        .unwrap_or(false)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
