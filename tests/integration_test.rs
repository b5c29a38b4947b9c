use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use contribution_network::network::{self, BuildConfig, EstimatorConfig, Link, ProcessId, Selection};
use contribution_network::product_system::ProductSystem;
use contribution_network::view::SankeyView;

const CLIMATE_CHANGE: Selection = Selection::Impact(200);

fn bicycle() -> Result<ProductSystem, Box<dyn std::error::Error>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/bicycle.json");
    Ok(ProductSystem::load(&path)?)
}

fn names(system: &ProductSystem, ids: impl Iterator<Item = ProcessId>) -> Vec<String> {
    ids.map(|id| system.process_name(id)).collect()
}

#[test]
fn test_unpruned_network() -> Result<(), Box<dyn std::error::Error>> {
    let system = bicycle()?;
    let selection = system.default_selection().ok_or("no default selection")?;
    assert_eq!(selection, CLIMATE_CHANGE);

    let network = network::build(
        system.reference_process,
        &selection,
        &BuildConfig::new(0.0),
        system.table.as_ref(),
        &system.index,
    );

    assert_eq!(
        names(&system, network.nodes().iter().map(|n| n.id)),
        vec![
            "bicycle assembly",
            "frame production",
            "wheel production",
            "waste incineration",
            "steel production",
            "electricity mix",
            "rubber production",
        ]
    );
    assert_eq!(network.edge_count(), 9);
    // steel and electricity supply each other
    assert!(network.edge(5, 4).is_some() && network.edge(4, 5).is_some());
    assert!(network.is_consistent());
    Ok(())
}

#[test]
fn test_pruned_network() -> Result<(), Box<dyn std::error::Error>> {
    let system = bicycle()?;
    let network = network::build(
        system.reference_process,
        &CLIMATE_CHANGE,
        &BuildConfig::new(0.25),
        system.table.as_ref(),
        &system.index,
    );

    let ids: Vec<ProcessId> = network.nodes().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    let pairs: HashSet<(ProcessId, ProcessId)> = network.edges().iter().map(|e| (e.provider, e.consumer)).collect();
    assert_eq!(pairs, HashSet::from([(2, 1), (3, 1), (4, 2), (4, 3)]));
    assert_eq!(network.edge(2, 1).map(|e| e.share), Some(0.55));
    Ok(())
}

#[test]
fn test_dangling_links_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let system = bicycle()?;
    let dangling = network::dangling_links(&system.index, system.table.as_ref());
    assert_eq!(dangling, vec![Link::new(9, 6, 16)]);
    Ok(())
}

#[test]
fn test_estimated_cutoff() -> Result<(), Box<dyn std::error::Error>> {
    let system = bicycle()?;
    let config = EstimatorConfig::new(4).with_tolerance(0);
    let cutoff = network::estimate_cutoff(
        system.reference_process,
        &CLIMATE_CHANGE,
        system.table.as_ref(),
        &system.index,
        &config,
    );

    assert!(cutoff > 0.0 && cutoff <= 0.3, "cutoff {}", cutoff);
    let network = network::build(
        system.reference_process,
        &CLIMATE_CHANGE,
        &BuildConfig::new(cutoff),
        system.table.as_ref(),
        &system.index,
    );
    assert_eq!(network.node_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_view_switches_selection_and_cutoff() -> Result<(), Box<dyn std::error::Error>> {
    let system = bicycle()?;
    let view = SankeyView::new(
        system.reference_process,
        Arc::clone(&system.index),
        Arc::clone(&system.table),
        CLIMATE_CHANGE,
        BuildConfig::new(0.0),
    );
    let unpruned = view.current().await;
    assert_eq!(unpruned.node_count(), 7);

    assert!(view.update(CLIMATE_CHANGE, 0.5).await?);
    assert_eq!(view.current().await.node_count(), 3);

    assert!(view.update(Selection::Flow(100), 0.5).await?);
    let flow_network = view.current().await;
    assert_eq!(flow_network.selection(), Selection::Flow(100));
    assert_eq!(flow_network.node_count(), 2);

    // networks handed out earlier stay as they were
    assert_eq!(unpruned.node_count(), 7);
    Ok(())
}

#[test]
fn test_network_serializes_to_json() -> Result<(), Box<dyn std::error::Error>> {
    let system = bicycle()?;
    let network = network::build(
        system.reference_process,
        &CLIMATE_CHANGE,
        &BuildConfig::new(0.5),
        system.table.as_ref(),
        &system.index,
    );
    let json: serde_json::Value = serde_json::to_value(&network)?;
    assert_eq!(json["root"], 1);
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["edges"][0]["provider"], 2);
    Ok(())
}
