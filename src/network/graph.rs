use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use super::model::{FlowId, Link, ProcessId, Selection};
use super::oracle::{ContributionFigures, ContributionOracle};

/// A process that made it into the network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessNode {
    pub id: ProcessId,
    pub direct: f64,
    pub upstream: f64,
    /// Upstream contribution relative to the root's
    pub share: f64,
    /// Providers linked into this node, each listed once
    pub children: Vec<ProcessId>,
}

impl ProcessNode {
    pub(crate) fn new(id: ProcessId, figures: ContributionFigures, total: f64) -> Self {
        Self {
            id,
            direct: figures.direct,
            upstream: figures.upstream,
            share: relative(figures.upstream, total),
            children: Vec::new(),
        }
    }
}

/// Aggregated link between two nodes of the network
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphLink {
    pub provider: ProcessId,
    pub consumer: ProcessId,
    /// Provider's part of the consumer's upstream contribution, in [0, 1]
    pub share: f64,
    /// Part of the total result flowing through this link
    pub weight: f64,
}

fn relative(value: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        0.0
    } else {
        value / total
    }
}

/// Pruned graph of contributors for one selection and cutoff.
///
/// Nodes and links are kept in creation order. A network handed to a viewer
/// is never changed again; incremental operations work on an owned copy.
#[derive(Debug, Clone, Serialize)]
pub struct ContributionNetwork {
    root: ProcessId,
    selection: Selection,
    cutoff: f64,
    #[serde(skip)]
    max_node_count: Option<usize>,
    truncated: bool,
    nodes: Vec<ProcessNode>,
    edges: Vec<GraphLink>,
    #[serde(skip)]
    node_positions: HashMap<ProcessId, usize>,
    #[serde(skip)]
    edge_positions: HashMap<(ProcessId, ProcessId), usize>,
    /// Flows already counted into the share of each linked pair
    #[serde(skip)]
    flows: HashMap<(ProcessId, ProcessId), Vec<FlowId>>,
}

impl ContributionNetwork {
    pub(crate) fn new(root: ProcessNode, selection: Selection, cutoff: f64) -> Self {
        let mut network = Self {
            root: root.id,
            selection,
            cutoff,
            max_node_count: None,
            truncated: false,
            nodes: Vec::new(),
            edges: Vec::new(),
            node_positions: HashMap::new(),
            edge_positions: HashMap::new(),
            flows: HashMap::new(),
        };
        network.add_node(root);
        network
    }

    /// Returns false if a node with this id already exists
    pub(crate) fn add_node(&mut self, node: ProcessNode) -> bool {
        if self.node_positions.contains_key(&node.id) {
            return false;
        }
        self.node_positions.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Adds `share` to the link between the two nodes, creating it if needed.
    /// Both nodes must exist.
    pub(crate) fn add_share(&mut self, provider: ProcessId, consumer: ProcessId, share: f64) {
        let consumer_share = self.node(consumer).map(|n| n.share).unwrap_or(0.0);
        if let Some(&pos) = self.edge_positions.get(&(provider, consumer)) {
            let edge = &mut self.edges[pos];
            edge.share = (edge.share + share).clamp(0.0, 1.0);
            edge.weight = edge.share * consumer_share;
            return;
        }
        self.edge_positions.insert((provider, consumer), self.edges.len());
        self.edges.push(GraphLink {
            provider,
            consumer,
            share,
            weight: share * consumer_share,
        });
        if let Some(&pos) = self.node_positions.get(&consumer) {
            self.nodes[pos].children.push(provider);
        }
    }

    /// Records that `flow` is part of the share between the two nodes
    pub(crate) fn count_flow(&mut self, provider: ProcessId, consumer: ProcessId, flow: FlowId) {
        let flows = self.flows.entry((provider, consumer)).or_default();
        if !flows.contains(&flow) {
            flows.push(flow);
        }
    }

    pub(crate) fn set_max_node_count(&mut self, max_node_count: Option<usize>) {
        self.max_node_count = max_node_count;
    }

    pub(crate) fn set_truncated(&mut self, truncated: bool) {
        self.truncated = truncated;
    }

    pub(crate) fn finish(self) -> Self {
        debug_assert!(
            self.is_consistent(),
            "network for {} refers to nodes it does not contain",
            self.selection
        );
        self
    }

    pub fn root(&self) -> ProcessId {
        self.root
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Whether the node limit stopped the build before it was complete
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn nodes(&self) -> &[ProcessNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphLink] {
        &self.edges
    }

    pub fn node(&self, id: ProcessId) -> Option<&ProcessNode> {
        self.node_positions.get(&id).map(|&pos| &self.nodes[pos])
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.node_positions.contains_key(&id)
    }

    pub fn edge(&self, provider: ProcessId, consumer: ProcessId) -> Option<&GraphLink> {
        self.edge_positions.get(&(provider, consumer)).map(|&pos| &self.edges[pos])
    }

    pub fn edges_into(&self, id: ProcessId) -> impl Iterator<Item = &GraphLink> + '_ {
        self.edges.iter().filter(move |e| e.consumer == id)
    }

    pub fn edges_out_of(&self, id: ProcessId) -> impl Iterator<Item = &GraphLink> + '_ {
        self.edges.iter().filter(move |e| e.provider == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every link joins two existing nodes and no pair is linked twice
    pub fn is_consistent(&self) -> bool {
        let mut pairs = HashSet::new();
        self.edges.iter().all(|e| {
            self.contains(e.provider) && self.contains(e.consumer) && pairs.insert((e.provider, e.consumer))
        }) && self.contains(self.root)
    }

    /// Derives the network for a higher cutoff from the cached shares.
    ///
    /// Gives the same nodes and links, in the same order, as a rebuild with
    /// `cutoff`. Returns `None` when the cutoff is lower than this network's
    /// or the network was truncated, since the result then needs links this
    /// network never saw.
    pub fn prune(&self, cutoff: f64) -> Option<ContributionNetwork> {
        if cutoff < self.cutoff || self.truncated {
            return None;
        }
        let root = self.node(self.root)?;
        let mut pruned = ContributionNetwork::new(detached(root), self.selection, cutoff);
        pruned.max_node_count = self.max_node_count;
        let mut queue = VecDeque::from([self.root]);
        while let Some(consumer) = queue.pop_front() {
            for edge in self.edges_into(consumer) {
                if cutoff > 0.0 && edge.share < cutoff {
                    continue;
                }
                if !pruned.contains(edge.provider) {
                    if let Some(provider) = self.node(edge.provider) {
                        pruned.add_node(detached(provider));
                        queue.push_back(edge.provider);
                    }
                }
                pruned.add_share(edge.provider, consumer, edge.share);
                if let Some(flows) = self.flows.get(&(edge.provider, consumer)) {
                    pruned.flows.insert((edge.provider, consumer), flows.clone());
                }
            }
        }
        Some(pruned.finish())
    }

    /// Adds a single link without rebuilding.
    ///
    /// The consumer must already be part of the network; the provider node is
    /// created from the oracle's figures when missing but is not expanded.
    /// Returns false when nothing was added: the link is already counted,
    /// its pair stays below the cutoff or a new node would exceed the limit.
    pub fn insert_link<O: ContributionOracle + ?Sized>(&mut self, link: &Link, oracle: &O) -> bool {
        let Some(consumer) = self.node(link.consumer) else {
            return false;
        };
        let pair = (link.provider, link.consumer);
        if self.flows.get(&pair).is_some_and(|flows| flows.contains(&link.flow)) {
            return false;
        }
        let selection = self.selection;
        let provider_figures = oracle.figures(link.provider, &selection);
        if provider_figures.upstream == 0.0 || consumer.upstream == 0.0 {
            return false;
        }
        let share = (oracle.link_contribution(link, &selection) / consumer.upstream).clamp(0.0, 1.0);
        if !share.is_finite() {
            return false;
        }
        let pair_share = self.edge(link.provider, link.consumer).map_or(0.0, |e| e.share) + share;
        if self.cutoff > 0.0 && pair_share < self.cutoff {
            return false;
        }
        if !self.contains(link.provider) {
            if self.max_node_count.is_some_and(|max| self.nodes.len() >= max) {
                self.truncated = true;
                return false;
            }
            let total = self.node(self.root).map(|n| n.upstream).unwrap_or(0.0);
            self.add_node(ProcessNode::new(link.provider, provider_figures, total));
        }
        self.add_share(link.provider, link.consumer, share);
        self.count_flow(link.provider, link.consumer, link.flow);
        true
    }

    /// Removes the link between two nodes together with every node that can
    /// no longer be reached from the root. Returns false if there was no
    /// such link.
    pub fn remove_link(&mut self, provider: ProcessId, consumer: ProcessId) -> bool {
        let Some(pos) = self.edge_positions.get(&(provider, consumer)).copied() else {
            return false;
        };
        self.edges.remove(pos);
        if let Some(&node_pos) = self.node_positions.get(&consumer) {
            self.nodes[node_pos].children.retain(|&c| c != provider);
        }

        let mut reachable = HashSet::from([self.root]);
        let mut queue = VecDeque::from([self.root]);
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| e.consumer == current) {
                if reachable.insert(edge.provider) {
                    queue.push_back(edge.provider);
                }
            }
        }

        self.nodes.retain(|n| reachable.contains(&n.id));
        self.edges
            .retain(|e| reachable.contains(&e.provider) && reachable.contains(&e.consumer));
        for node in self.nodes.iter_mut() {
            node.children.retain(|c| reachable.contains(c));
        }
        self.reindex();
        let edge_positions = &self.edge_positions;
        self.flows.retain(|pair, _| edge_positions.contains_key(pair));
        true
    }

    fn reindex(&mut self) {
        self.node_positions = self.nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        self.edge_positions = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.provider, e.consumer), i))
            .collect();
    }

    /// Converts the network into a petgraph graph: node weights are process
    /// ids, edges point from provider to consumer and carry the share.
    pub fn to_graph(&self) -> DiGraph<ProcessId, f64> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let indices: HashMap<ProcessId, NodeIndex> =
            self.nodes.iter().map(|n| (n.id, graph.add_node(n.id))).collect();
        for edge in &self.edges {
            if let (Some(&from), Some(&to)) = (indices.get(&edge.provider), indices.get(&edge.consumer)) {
                graph.add_edge(from, to, edge.share);
            }
        }
        graph
    }
}

fn detached(node: &ProcessNode) -> ProcessNode {
    ProcessNode {
        children: Vec::new(),
        ..node.clone()
    }
}
