//! `owner, mint` line writer

use std::io::Write;

use anyhow::{Context, Result};
use candymine_core::Sink;

use crate::input::TokenLine;

/// Writes one `<owner>, <mint>` line per resolved item, flushed immediately.
pub struct HolderLines<W: Write> {
    out: W,
}

impl<W: Write> HolderLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink<TokenLine, String> for HolderLines<W> {
    fn emit(&mut self, item: &TokenLine, owner: &String) -> Result<()> {
        writeln!(self.out, "{owner}, {}", item.mint).context("Failed to write output")?;
        self.out.flush().context("Failed to flush output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        let mut sink = HolderLines::new(Vec::new());
        let item = TokenLine {
            line: 1,
            mint: "addr2".into(),
        };
        sink.emit(&item, &"ownerX".to_string()).unwrap();
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "ownerX, addr2\n");
    }
}
