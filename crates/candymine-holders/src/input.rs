//! Token line reader

use std::io::BufRead;

use anyhow::{Context, Result};
use candymine_core::WorkItem;

/// One input line reduced to the mint it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLine {
    /// 1-based line number in the input
    pub line: usize,
    pub mint: String,
}

impl WorkItem for TokenLine {
    fn label(&self) -> &str {
        &self.mint
    }
}

/// Last whitespace-separated token of a line, if any.
pub fn mint_of(line: &str) -> Option<&str> {
    line.split_whitespace().next_back()
}

/// Iterate the mints of `reader`, one per non-blank line, in input order.
///
/// Read errors are yielded as `Err` and end the run.
pub fn token_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<TokenLine>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = match line.with_context(|| format!("Failed to read input line {}", idx + 1)) {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            match mint_of(&line) {
                Some(mint) => Some(Ok(TokenLine {
                    line: idx + 1,
                    mint: mint.to_string(),
                })),
                None => {
                    log::debug!("line {}: blank, skipped", idx + 1);
                    None
                }
            }
        })
}
