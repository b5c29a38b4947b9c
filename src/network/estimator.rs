use log2::debug;

use super::builder::count_nodes;
use super::config::{BuildConfig, EstimatorConfig};
use super::link_index::LinkIndex;
use super::model::{ProcessId, Selection};
use super::oracle::ContributionOracle;

/// Searches a cutoff for which the network has about
/// `config.target_node_count` nodes.
///
/// Bisects [0, 1] relying on the node count shrinking as the cutoff grows.
/// Stops at the first probe within the tolerance, otherwise after
/// `config.max_probes` probes with the best cutoff seen. Odd data that breaks
/// the monotonicity only makes the answer worse, the probe budget still holds.
pub fn estimate_cutoff<O: ContributionOracle + ?Sized>(
    start: ProcessId,
    selection: &Selection,
    oracle: &O,
    index: &LinkIndex,
    config: &EstimatorConfig,
) -> f64 {
    let target = config.target_node_count;
    let probe = |cutoff: f64| {
        let mut build_config = BuildConfig::new(cutoff);
        build_config.max_node_count = config.max_node_count;
        count_nodes(start, selection, &build_config, oracle, index)
    };

    if config.max_probes == 0 {
        return 0.0;
    }

    // nothing to prune if the full network already fits
    let unpruned = probe(0.0);
    if unpruned <= target.saturating_add(config.tolerance) {
        debug!("Full network of {} nodes fits target {}", unpruned, target);
        return 0.0;
    }

    let mut best = (0.0, unpruned.abs_diff(target));
    let (mut low, mut high) = (0.0_f64, 1.0_f64);
    for probe_nr in 1..config.max_probes {
        let cutoff = (low + high) / 2.0;
        let count = probe(cutoff);
        let distance = count.abs_diff(target);
        debug!("Probe {}: cutoff {} gives {} nodes", probe_nr, cutoff, count);
        if distance < best.1 {
            best = (cutoff, distance);
        }
        if distance <= config.tolerance {
            return cutoff;
        }
        if count > target {
            low = cutoff;
        } else {
            high = cutoff;
        }
    }

    debug!("Probe budget used up, best cutoff {} is {} nodes off", best.0, best.1);
    best.0
}
