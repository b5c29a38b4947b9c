use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::link_index::LinkIndex;
use super::model::{FlowId, Link, ProcessId, Selection};

/// Direct and upstream contribution of one process to one selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ContributionFigures {
    pub direct: f64,
    pub upstream: f64,
}

/// Read access to an already calculated result.
///
/// Every query answers 0.0 for a process, link or selection it knows nothing
/// about. Implementations are expected to be cheap to query repeatedly.
pub trait ContributionOracle {
    /// Contribution of the process itself, without its suppliers
    fn direct(&self, process: ProcessId, selection: &Selection) -> f64;

    /// Contribution of the process and everything it draws upon
    fn upstream(&self, process: ProcessId, selection: &Selection) -> f64;

    /// Part of the consumer's upstream contribution delivered through `link`
    fn link_contribution(&self, link: &Link, selection: &Selection) -> f64;

    /// Whether the result has any figures for this process
    fn contains(&self, _process: ProcessId) -> bool {
        true
    }

    fn figures(&self, process: ProcessId, selection: &Selection) -> ContributionFigures {
        ContributionFigures {
            direct: self.direct(process, selection),
            upstream: self.upstream(process, selection),
        }
    }
}

type LinkKey = (ProcessId, ProcessId, FlowId);

/// In-memory result table, filled from a result file or by hand in tests
#[derive(Debug, Default)]
pub struct ContributionTable {
    figures: HashMap<Selection, HashMap<ProcessId, ContributionFigures>>,
    links: HashMap<Selection, HashMap<LinkKey, f64>>,
    processes: HashSet<ProcessId>,
}

impl ContributionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_figures(&mut self, selection: Selection, process: ProcessId, direct: f64, upstream: f64) {
        self.processes.insert(process);
        self.figures
            .entry(selection)
            .or_default()
            .insert(process, ContributionFigures { direct, upstream });
    }

    /// Adds to the contribution of `link`, so flows recorded twice accumulate
    pub fn add_link_contribution(&mut self, selection: Selection, link: &Link, value: f64) {
        *self
            .links
            .entry(selection)
            .or_default()
            .entry((link.provider, link.consumer, link.flow))
            .or_insert(0.0) += value;
    }

    pub fn with_figures(mut self, selection: Selection, process: ProcessId, direct: f64, upstream: f64) -> Self {
        self.set_figures(selection, process, direct, upstream);
        self
    }

    pub fn with_link_contribution(mut self, selection: Selection, link: &Link, value: f64) -> Self {
        self.add_link_contribution(selection, link, value);
        self
    }

    pub fn selections(&self) -> impl Iterator<Item = &Selection> {
        self.figures.keys()
    }

    pub fn has_selection(&self, selection: &Selection) -> bool {
        self.figures.contains_key(selection)
    }

    fn lookup(&self, process: ProcessId, selection: &Selection) -> ContributionFigures {
        self.figures
            .get(selection)
            .and_then(|by_process| by_process.get(&process))
            .copied()
            .unwrap_or_default()
    }
}

impl ContributionOracle for ContributionTable {
    fn direct(&self, process: ProcessId, selection: &Selection) -> f64 {
        self.lookup(process, selection).direct
    }

    fn upstream(&self, process: ProcessId, selection: &Selection) -> f64 {
        self.lookup(process, selection).upstream
    }

    fn link_contribution(&self, link: &Link, selection: &Selection) -> f64 {
        self.links
            .get(selection)
            .and_then(|by_link| by_link.get(&(link.provider, link.consumer, link.flow)))
            .copied()
            .unwrap_or(0.0)
    }

    fn contains(&self, process: ProcessId) -> bool {
        self.processes.contains(&process)
    }
}

/// Links with an endpoint the result has no figures for.
///
/// The builder silently treats those as zero contributions; callers report them.
pub fn dangling_links<O: ContributionOracle + ?Sized>(index: &LinkIndex, oracle: &O) -> Vec<Link> {
    index
        .links()
        .iter()
        .filter(|link| !oracle.contains(link.provider) || !oracle.contains(link.consumer))
        .copied()
        .collect()
}
