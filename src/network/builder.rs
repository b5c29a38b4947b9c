use log2::{debug, trace};
use std::collections::{HashMap, HashSet, VecDeque};

use super::config::BuildConfig;
use super::graph::{ContributionNetwork, ProcessNode};
use super::link_index::LinkIndex;
use super::model::{FlowId, ProcessId, Selection};
use super::oracle::{ContributionFigures, ContributionOracle};

/// Event produced while walking the link graph from the root
enum Step {
    Node(ProcessId, ContributionFigures),
    Link {
        provider: ProcessId,
        consumer: ProcessId,
        share: f64,
        flows: Vec<FlowId>,
    },
}

/// Breadth-first walk over the providers of `start`.
///
/// Each process is expanded at most once. Links of one consumer coming from
/// the same provider are summed before the cutoff is applied. Returns
/// whether the node limit cut the walk short.
fn walk<O, F>(
    start: ProcessId,
    selection: &Selection,
    config: &BuildConfig,
    oracle: &O,
    index: &LinkIndex,
    mut visit: F,
) -> bool
where
    O: ContributionOracle + ?Sized,
    F: FnMut(Step),
{
    let root = oracle.figures(start, selection);
    visit(Step::Node(start, root));
    if root.upstream == 0.0 || !root.upstream.is_finite() {
        debug!("No contribution of {} to {}, nothing to expand", start, selection);
        return false;
    }

    let mut known: HashSet<ProcessId> = HashSet::from([start]);
    let mut queue: VecDeque<(ProcessId, f64)> = VecDeque::from([(start, root.upstream)]);
    let mut truncated = false;

    while let Some((consumer, upstream)) = queue.pop_front() {
        if upstream == 0.0 || !upstream.is_finite() {
            continue;
        }

        // provider -> summed link contribution, first occurrence decides order
        let mut providers: Vec<(ProcessId, f64, Vec<FlowId>)> = Vec::new();
        let mut positions: HashMap<ProcessId, usize> = HashMap::new();
        for link in index.incoming(consumer) {
            if oracle.upstream(link.provider, selection) == 0.0 {
                trace!("Skipped {} -> {}: provider has no contribution", link.provider, consumer);
                continue;
            }
            let contribution = oracle.link_contribution(link, selection);
            match positions.get(&link.provider) {
                Some(&pos) => {
                    let (_, summed, flows) = &mut providers[pos];
                    *summed += contribution;
                    if !flows.contains(&link.flow) {
                        flows.push(link.flow);
                    }
                }
                None => {
                    positions.insert(link.provider, providers.len());
                    providers.push((link.provider, contribution, vec![link.flow]));
                }
            }
        }

        for (provider, contribution, flows) in providers {
            let share = (contribution / upstream).clamp(0.0, 1.0);
            if !share.is_finite() {
                continue;
            }
            if config.cutoff > 0.0 && share < config.cutoff {
                trace!("Pruned {} -> {} with share {}", provider, consumer, share);
                continue;
            }
            if !known.contains(&provider) {
                if config.max_node_count.is_some_and(|max| known.len() >= max) {
                    truncated = true;
                    continue;
                }
                known.insert(provider);
                let figures = oracle.figures(provider, selection);
                visit(Step::Node(provider, figures));
                queue.push_back((provider, figures.upstream));
            }
            visit(Step::Link {
                provider,
                consumer,
                share,
                flows,
            });
        }
    }

    truncated
}

/// Builds the contribution network of `selection` rooted at `start`.
///
/// Never fails: unknown processes, selections and zero contributions just
/// leave things out, in the worst case the network holds only the root.
pub fn build<O: ContributionOracle + ?Sized>(
    start: ProcessId,
    selection: &Selection,
    config: &BuildConfig,
    oracle: &O,
    index: &LinkIndex,
) -> ContributionNetwork {
    let root = oracle.figures(start, selection);
    let mut network = ContributionNetwork::new(
        ProcessNode::new(start, root, root.upstream),
        *selection,
        config.cutoff,
    );
    network.set_max_node_count(config.max_node_count);

    let truncated = walk(start, selection, config, oracle, index, |step| match step {
        // the root arrives first and is already in place
        Step::Node(id, figures) => {
            network.add_node(ProcessNode::new(id, figures, root.upstream));
        }
        Step::Link {
            provider,
            consumer,
            share,
            flows,
        } => {
            network.add_share(provider, consumer, share);
            for flow in flows {
                network.count_flow(provider, consumer, flow);
            }
        }
    });

    network.set_truncated(truncated);
    debug!(
        "Built network for {} at cutoff {}: {} nodes, {} links{}",
        selection,
        config.cutoff,
        network.node_count(),
        network.edge_count(),
        if truncated { " (node limit reached)" } else { "" }
    );
    network.finish()
}

/// Number of nodes `build` would produce, without materializing them
pub fn count_nodes<O: ContributionOracle + ?Sized>(
    start: ProcessId,
    selection: &Selection,
    config: &BuildConfig,
    oracle: &O,
    index: &LinkIndex,
) -> usize {
    let mut count = 0;
    walk(start, selection, config, oracle, index, |step| {
        if let Step::Node(..) = step {
            count += 1;
        }
    });
    count
}
