use anyhow::{Context, Result};
use contribution_network::config;
use contribution_network::network::{self, BuildConfig, ContributionNetwork, EstimatorConfig};
use contribution_network::product_system::ProductSystem;
use contribution_network::view::SankeyView;
use log2::*;
use petgraph::dot::Dot;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = config::Config::new();
    cfg.validate()?;
    let _log2 = stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("contribution_network")) // only our own modules
        .compress(false)
        .level(cfg.log_level.to_string())
        .start();

    let system = ProductSystem::load(&cfg.input)?;
    for link in network::dangling_links(&system.index, system.table.as_ref()) {
        warn!(
            "Link {} -> {} (flow {}) refers to a process without results, it is left out",
            link.provider, link.consumer, link.flow
        );
    }

    let selection = match cfg.selection()? {
        Some(selection) => selection,
        None => system
            .default_selection()
            .context("The result contains neither impact nor flow results")?,
    };
    info!("Showing contributions to {}", system.selection_name(&selection));

    let root = system.reference_process;
    let cutoff = match cfg.target_nodes {
        Some(target) => {
            let index = Arc::clone(&system.index);
            let table = Arc::clone(&system.table);
            let estimator = EstimatorConfig::new(target).with_max_node_count(cfg.max_nodes);
            let cutoff = tokio::task::spawn_blocking(move || {
                network::estimate_cutoff(root, &selection, table.as_ref(), &index, &estimator)
            })
            .await?;
            info!("Estimated cutoff {} for about {} nodes", cutoff, target);
            cutoff
        }
        None => cfg.cutoff,
    };

    let view = SankeyView::new(
        root,
        Arc::clone(&system.index),
        Arc::clone(&system.table),
        selection,
        BuildConfig::new(cutoff).with_max_node_count(cfg.max_nodes),
    );
    let network = view.current().await;
    print_network(&network, &system);

    if let Some(path) = &cfg.output_file {
        write_network(&network, &system, path)?;
        info!("Network written to {:?}", path);
    }

    debug!("Finished after {:?}", START_TIME.elapsed());
    Ok(())
}

fn print_network(network: &ContributionNetwork, system: &ProductSystem) {
    println!(
        "{} nodes, {} links at cutoff {}{}",
        network.node_count(),
        network.edge_count(),
        network.cutoff(),
        if network.is_truncated() { " (node limit reached)" } else { "" }
    );
    for node in network.nodes() {
        println!(
            "  {:<40} direct {:>12.4e}  upstream {:>12.4e}  {:>6.2}%",
            system.process_name(node.id),
            node.direct,
            node.upstream,
            node.share * 100.0
        );
    }
    for edge in network.edges() {
        println!(
            "  {} -> {}: {:.2}%",
            system.process_name(edge.provider),
            system.process_name(edge.consumer),
            edge.share * 100.0
        );
    }
}

fn write_network(network: &ContributionNetwork, system: &ProductSystem, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "dot") {
        let graph = network
            .to_graph()
            .map(|_, id| system.process_name(*id), |_, share| format!("{:.2}%", share * 100.0));
        format!("{}", Dot::new(&graph))
    } else {
        serde_json::to_string_pretty(network)?
    };
    std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
