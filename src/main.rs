use anyhow::Result;
use clap::Parser;
use std::path::Path;

use network_compare::data;
use network_compare::storage;
use network_compare::{CentralityMetric, ComparisonRequest, ComparisonSession, EngineConfig};

#[derive(Parser, Debug)]
#[clap(
    name = "network-compare",
    about = "Compare interaction networks against a baseline graph"
)]
struct Cli {
    /// Baseline graph payload (JSON: nodes + links)
    #[clap(long)]
    baseline: String,

    /// Candidate graph payload to compare; repeat for several
    #[clap(long)]
    candidate: Vec<String>,

    /// Community detection output used by the community filter
    #[clap(long)]
    communities: Option<String>,

    /// Engine configuration file (JSON)
    #[clap(long)]
    config: Option<String>,

    /// Output directory for results
    #[clap(long, default_value = "comparison_results")]
    output_dir: String,

    /// Keep only nodes with at least N connections (configured threshold when N is omitted)
    #[clap(long, value_name = "N", num_args = 0..=1)]
    activity: Option<Option<usize>>,

    /// Keep only nodes whose betweenness reaches the strong-connection threshold
    #[clap(long)]
    strong: bool,

    /// Override the strong-connection betweenness threshold
    #[clap(long)]
    strong_threshold: Option<f64>,

    /// Keep only links inside a community and group nodes by community
    #[clap(long)]
    community: bool,

    /// Keep only nodes whose identifier contains this text
    #[clap(long)]
    node_filter: Option<String>,

    /// Keep only links with at least this weight
    #[clap(long)]
    min_weight: Option<f64>,

    /// Highlight the most central nodes by this metric
    #[clap(long)]
    highlight: Option<CentralityMetric>,

    /// Share of nodes tagged by --highlight
    #[clap(long)]
    top_fraction: Option<f64>,

    /// Tag nodes present in both the baseline and a candidate
    #[clap(long)]
    highlight_common: bool,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn engine_config(args: &Cli) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(Some(threshold)) = args.activity {
        config.activity_threshold = threshold;
    }
    if let Some(threshold) = args.strong_threshold {
        config.strong_connection_threshold = threshold;
    }
    if let Some(fraction) = args.top_fraction {
        config.highlight_top_fraction = fraction;
    }

    config.validate()?;
    Ok(config)
}

fn candidate_label(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = engine_config(&args)?;

    log::info!("Starting network comparison");
    log::info!("Baseline: {}", args.baseline);
    log::info!("Output: {}", args.output_dir);

    // 1. Load the baseline
    let baseline = data::load_payload(&args.baseline)?;
    let mut session = ComparisonSession::from_raw(&baseline, config);

    if let Some(path) = &args.communities {
        let communities = data::load_communities(path)?;
        log::info!("Loaded {} community summaries", communities.summaries.len());
        session.set_communities(communities.map);
    }

    // 2. Load and compare each candidate
    for path in &args.candidate {
        let raw = data::load_payload(path)?;
        session.load_candidate(candidate_label(path), &raw)?;
    }

    // 3. Shared filters, applied to the baseline and every candidate
    if args.activity.is_some() {
        session.enable_activity_filter();
    }
    if args.strong {
        session.enable_strong_connection_filter();
    }
    if args.community {
        if let Err(err) = session.enable_community_filter() {
            log::warn!("Community filter skipped: {}", err);
        }
    }

    session.apply_request(&ComparisonRequest {
        node_filter: args.node_filter.clone().unwrap_or_default(),
        min_weight: args.min_weight,
        metric: args.highlight,
        highlight_common: args.highlight_common,
    });

    // 4. Report
    let summary = session.baseline_summary();
    log::info!(
        "Baseline: {} nodes, {} links, density {:.4}, {} component(s)",
        summary.node_count,
        summary.edge_count,
        summary.density,
        summary.component_count
    );

    for (idx, stats) in session.all_statistics()? {
        let label = session.candidate(idx)?.label().to_string();
        log::info!(
            "{}: nodes {} -> {} ({:+.1}%), links {} -> {} ({:+.1}%), {} common ({:.1}%)",
            label,
            stats.original_node_count,
            stats.comparison_node_count,
            stats.node_change_percent,
            stats.original_link_count,
            stats.comparison_link_count,
            stats.link_change_percent,
            stats.common_nodes_count,
            stats.common_nodes_percent
        );
    }

    // 5. Save results
    storage::save_results(&mut session, &args.output_dir)?;

    log::info!("Comparison complete. Results saved to {}", args.output_dir);

    Ok(())
}
