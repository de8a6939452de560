//! Main runner for the upload pipeline

use std::io::Write;

use anyhow::Result;
use candymine_core::{Diagnostics, Driver, Summary};
use candymine_store::MetadataDb;
use indicatif::ProgressBar;

use crate::bundler::Bundler;
use crate::config::Config;
use crate::resolve::UploadResolver;
use crate::sink::UploadLines;
use crate::source::metadata_files;

/// Upload every file of `config.directory`, writing `identifier => uri`
/// lines to `output`.
///
/// With a database, identifiers that already have a recorded upload are
/// skipped and each new upload is recorded.
pub fn run<B, W, D>(
    config: &Config,
    bundler: B,
    db: Option<&MetadataDb>,
    output: W,
    diagnostics: D,
    pb: ProgressBar,
) -> Result<Summary>
where
    B: Bundler,
    W: Write,
    D: Diagnostics,
{
    let mut files = metadata_files(&config.directory)?;
    let listed = files.len();

    if let Some(db) = db {
        let done = db.repaired_addresses()?;
        files.retain(|f| !done.contains(&f.identifier));
        if files.len() < listed {
            log::info!(
                "Skipping {} already uploaded (recorded in {})",
                listed - files.len(),
                db.path().display()
            );
        }
    }

    log::info!(
        "Uploading {} files from {} to {} (chill {}ms)",
        files.len(),
        config.directory.display(),
        config.bundler_url,
        config.chill.as_millis()
    );
    pb.set_length(files.len() as u64);

    let resolver = UploadResolver::new(bundler, &config.gateway_url);
    let mut sink = UploadLines::new(output, db);
    let mut driver = Driver::with_diagnostics(&resolver, config.retry, config.chill, diagnostics)
        .progress(pb);

    let summary = driver.run(files.into_iter().map(Ok), &mut sink)?;
    summary.log("Upload");
    Ok(summary)
}
