//! Dedupe command - drop repeated posts from a corpus file.

use std::path::Path;

use anyhow::Context;

use crate::dedupe::deduplicate;
use crate::storage::{load_corpus, save_json_atomic};

pub fn run(input: &Path, output: &Path) -> i32 {
    match dedupe_file(input, output) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            match e.downcast_ref::<crate::error::PipelineError>() {
                Some(pipeline_error) => pipeline_error.exit_code(),
                None => 1,
            }
        }
    }
}

fn dedupe_file(input: &Path, output: &Path) -> anyhow::Result<()> {
    let mut corpus = load_corpus(input)?;
    let before = corpus.len();
    let report = deduplicate(&mut corpus);

    save_json_atomic(output, &corpus)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Kept {} of {} posts ({} duplicate ids, {} duplicate content)",
        report.kept, before, report.duplicate_ids, report.duplicate_content
    );
    for (platform, id) in &report.removed {
        tracing::debug!(target: "cli", "removed {platform} post {id}");
    }
    println!("Wrote {}", output.display());
    Ok(())
}
