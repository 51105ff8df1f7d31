//! Markdown changelog rendered from git history.
use chrono::NaiveDate;
use regex::Regex;
use std::{path::Path, sync::LazyLock};

use crate::error::{AutoshipError, Result};

/// Default changelog file, overwritten on every run.
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// `git log --format` producing lines understood by [`ChangelogEntry::parse`].
pub const HISTORY_FORMAT: &str = "%ad %H %s (%an)";

// Message is greedy; author is the final parenthesized group and may itself
// hold one level of balanced parentheses, e.g. `Bob (CI)`.
static HISTORY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?<date>\S+) (?<id>\S+) (?<message>.*) ",
        r"\((?<author>[^()]*(?:\([^()]*\)[^()]*)*)\)$",
    ))
    .expect("history line pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub date: NaiveDate,
    pub commit_id: String,
    pub message: String,
    pub author: String,
}

impl ChangelogEntry {
    /// Parse `<date> <commit> <message> (<author>)`.
    pub fn parse(line: &str) -> Result<Self> {
        let caps = HISTORY_LINE.captures(line).ok_or_else(|| {
            AutoshipError::parse(format!("malformed history line: {line:?}"))
        })?;

        let date = NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d")
            .map_err(|err| {
                AutoshipError::parse(format!(
                    "invalid date in history line {line:?}: {err}"
                ))
            })?;

        Ok(Self {
            date,
            commit_id: caps["id"].to_string(),
            message: caps["message"].to_string(),
            author: caps["author"].to_string(),
        })
    }

    /// Remove every occurrence of the given prefixes from the message.
    pub fn strip_prefixes(&mut self, prefixes: &[String]) {
        for prefix in prefixes.iter().filter(|p| !p.is_empty()) {
            self.message = self.message.replace(prefix.as_str(), "");
        }
    }
}

/// Parse `git log` output, oldest first. Blank lines are ignored; any other
/// unparseable line fails the whole parse.
pub fn parse_history(output: &str) -> Result<Vec<ChangelogEntry>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(ChangelogEntry::parse)
        .collect()
}

pub fn render(entries: &[ChangelogEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "- {} - {} - {} - {}\n",
                e.date.format("%Y-%m-%d"),
                e.message,
                e.commit_id,
                e.author
            )
        })
        .collect()
}

/// Overwrite `path` with `content`. Nothing from a previous changelog is
/// kept.
pub async fn persist(content: &str, path: &Path) -> Result<()> {
    tokio::fs::write(path, content).await?;
    Ok(())
}
