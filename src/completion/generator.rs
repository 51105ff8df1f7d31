//! Turns a list of changed files into a commit message.
use log::*;
use std::fmt;

use crate::{
    completion::{
        request::{ChatMessage, CompletionRequest},
        traits::CompletionClient,
    },
    error::{AutoshipError, Result},
};

const SYSTEM_PROMPT: &str =
    "Generate a commit message for the following changes:\n\n";
const USER_PROMPT: &str =
    "Please generate a commit message for the changes listed above.";

/// A non-empty commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage(String);

impl CommitMessage {
    /// Returns `None` when the text is empty after trimming.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// First line, used as the pull request title.
    pub fn title(&self) -> &str {
        self.0.lines().next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct MessageGenerator {
    client: Box<dyn CompletionClient>,
}

impl MessageGenerator {
    pub fn new(client: Box<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn prompt(diff_summary: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                ChatMessage::system(format!("{SYSTEM_PROMPT}{diff_summary}")),
                ChatMessage::user(USER_PROMPT),
            ],
        }
    }

    pub async fn generate(&self, diff_summary: &str) -> Result<CommitMessage> {
        let completion =
            self.client.complete(Self::prompt(diff_summary)).await?;

        let message = CommitMessage::new(&completion).ok_or_else(|| {
            AutoshipError::upstream(
                "completion",
                None,
                "completion was empty",
                completion.clone(),
            )
        })?;

        debug!("generated commit message: {message}");

        Ok(message)
    }
}
