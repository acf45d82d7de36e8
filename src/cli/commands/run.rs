//! Run command - the full embedding, neighbor and clustering pipeline.

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use console::style;

use crate::cli::RunArgs;
use crate::config::{EmbeddingSource, Settings};
use crate::pipeline::{self, RunOutcome};

/// Apply command-line overrides on top of loaded settings.
pub fn apply_overrides(settings: &mut Settings, args: &RunArgs) {
    let pipeline = &mut settings.pipeline;
    if let Some(k) = args.clusters {
        pipeline.clusters = k;
    }
    if let Some(n) = args.neighbors {
        pipeline.neighbors = n;
    }
    if let Some(seed) = args.seed {
        pipeline.seed = seed;
    }
    if let Some(max) = args.max_iterations {
        pipeline.max_iterations = max;
    }
    if let Some(d) = args.dimensions {
        pipeline.dimensions = d;
    }
    if args.precomputed {
        pipeline.embedding_source = EmbeddingSource::Precomputed;
    }

    let paths = &mut settings.paths;
    if let Some(input) = &args.input {
        paths.input = input.clone();
    }
    if let Some(output) = &args.output {
        paths.output = output.clone();
    }
    if args.plot.is_some() {
        paths.plot = args.plot.clone();
    }
    if args.stats.is_some() {
        paths.stats = args.stats.clone();
    }
}

pub fn run(args: &RunArgs, settings: &Settings) -> i32 {
    let mut settings = settings.clone();
    apply_overrides(&mut settings, args);
    tracing::debug!(target: "cli", "effective pipeline config: {:?}", settings.pipeline);

    match pipeline::run(&settings.paths, &settings.pipeline) {
        Ok(outcome) => {
            print_outcome(&outcome);
            0
        }
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            e.exit_code()
        }
    }
}

fn print_outcome(outcome: &RunOutcome) {
    let report = &outcome.report;
    println!(
        "\n{}",
        style(format!(
            "Clustered {} posts ({} twitter, {} reddit) into {} clusters",
            report.posts,
            report.per_platform.twitter,
            report.per_platform.reddit,
            report.clusters.len()
        ))
        .cyan()
        .bold()
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Cluster", "Size", "Twitter", "Reddit", "Sample"]);
    for cluster in &report.clusters {
        table.add_row(vec![
            cluster.cluster.to_string(),
            cluster.size.to_string(),
            cluster.platforms.twitter.to_string(),
            cluster.platforms.reddit.to_string(),
            cluster.sample_posts.first().cloned().unwrap_or_default(),
        ]);
    }
    println!("{table}");

    let convergence = if report.converged {
        format!("converged after {} iterations", report.iterations)
    } else {
        format!("stopped at the iteration cap ({})", report.iterations)
    };
    println!(
        "{} {convergence}, inertia {:.4}",
        style("k-means:").dim(),
        report.inertia
    );

    println!("Wrote {}", outcome.output.display());
    if let Some(path) = &outcome.stats {
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &outcome.plot {
        println!("Wrote {}", path.display());
    }
    for failure in &outcome.failures {
        eprintln!(
            "{} could not write {}: {}",
            style("Warning:").yellow().bold(),
            failure.path.display(),
            failure.reason
        );
    }
}
