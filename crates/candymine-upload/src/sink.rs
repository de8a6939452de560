//! Output of the upload pipeline

use std::io::Write;

use anyhow::{Context, Result};
use candymine_core::Sink;
use candymine_store::MetadataDb;

use crate::source::MetadataFile;

/// Prints `identifier => uri` lines and, with a database, records each
/// mapping as a repair before printing it.
pub struct UploadLines<'a, W> {
    writer: W,
    db: Option<&'a MetadataDb>,
}

impl<'a, W: Write> UploadLines<'a, W> {
    pub fn new(writer: W, db: Option<&'a MetadataDb>) -> Self {
        Self { writer, db }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink<MetadataFile, String> for UploadLines<'_, W> {
    fn emit(&mut self, item: &MetadataFile, uri: &String) -> Result<()> {
        if let Some(db) = self.db {
            db.record_repair(&item.identifier, uri)?;
        }
        writeln!(self.writer, "{} => {uri}", item.identifier).context("Failed to write output")?;
        self.writer.flush().context("Failed to flush output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn item(identifier: &str) -> MetadataFile {
        MetadataFile {
            path: PathBuf::from(format!("{identifier}.json")),
            name: format!("{identifier}.json"),
            identifier: identifier.to_string(),
        }
    }

    #[test]
    fn prints_mapping() {
        let mut sink = UploadLines::new(Vec::new(), None);
        sink.emit(&item("a"), &"https://arweave.net/Q1".to_string())
            .unwrap();
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            "a => https://arweave.net/Q1\n"
        );
    }

    #[test]
    fn records_before_printing() {
        let dir = tempfile::tempdir().unwrap();
        let db = MetadataDb::open(&dir.path().join("t.db")).unwrap();
        let mut sink = UploadLines::new(Vec::new(), Some(&db));
        sink.emit(&item("meta1"), &"https://arweave.net/X".to_string())
            .unwrap();
        assert_eq!(
            db.repair("meta1").unwrap().as_deref(),
            Some("https://arweave.net/X")
        );
    }
}
