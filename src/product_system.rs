use anyhow::{Context, Result};
use log2::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::network::{ContributionTable, FlowId, Link, LinkIndex, ProcessId, Selection};

/// Id and display name of a process, flow or impact category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Named {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkContribution {
    pub provider: ProcessId,
    pub consumer: ProcessId,
    pub flow: FlowId,
    pub value: f64,
}

/// Calculated figures for one selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub selection: Selection,
    #[serde(default)]
    pub direct: HashMap<ProcessId, f64>,
    #[serde(default)]
    pub upstream: HashMap<ProcessId, f64>,
    #[serde(default)]
    pub links: Vec<LinkContribution>,
}

/// On-disk layout of a product system together with its result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSystemFile {
    pub reference_process: ProcessId,
    #[serde(default)]
    pub processes: Vec<Named>,
    #[serde(default)]
    pub flows: Vec<Named>,
    #[serde(default)]
    pub impacts: Vec<Named>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub results: Vec<SelectionResult>,
}

/// Loaded product system: topology, result table and names
pub struct ProductSystem {
    pub reference_process: ProcessId,
    pub index: Arc<LinkIndex>,
    pub table: Arc<ContributionTable>,
    process_names: HashMap<ProcessId, String>,
    flows: Vec<Named>,
    impacts: Vec<Named>,
}

impl ProductSystem {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read product system from {:?}", path))?;
        let system = Self::from_json(&json).with_context(|| format!("Invalid product system in {:?}", path))?;
        info!(
            "Loaded {} links and {} results from {:?}",
            system.index.len(),
            system.table.selections().count(),
            path
        );
        Ok(system)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ProductSystemFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    pub fn from_file(file: ProductSystemFile) -> Self {
        let mut table = ContributionTable::new();
        for result in &file.results {
            let mut processes: Vec<ProcessId> = result.direct.keys().chain(result.upstream.keys()).copied().collect();
            processes.sort_unstable();
            processes.dedup();
            for process in processes {
                let direct = result.direct.get(&process).copied().unwrap_or(0.0);
                let upstream = result.upstream.get(&process).copied().unwrap_or(0.0);
                table.set_figures(result.selection, process, direct, upstream);
            }
            for contribution in &result.links {
                let link = Link::new(contribution.provider, contribution.consumer, contribution.flow);
                table.add_link_contribution(result.selection, &link, contribution.value);
            }
            debug!("Read {} link contributions for {}", result.links.len(), result.selection);
        }

        Self {
            reference_process: file.reference_process,
            index: Arc::new(LinkIndex::build(file.links)),
            table: Arc::new(table),
            process_names: file.processes.into_iter().map(|p| (p.id, p.name)).collect(),
            flows: file.flows,
            impacts: file.impacts,
        }
    }

    /// The selection a freshly opened view starts with: the impact category
    /// with the smallest name if there are impact results, otherwise the
    /// flow with the smallest name.
    pub fn default_selection(&self) -> Option<Selection> {
        let first_by_name = |items: &[Named], to_selection: fn(u64) -> Selection| {
            items
                .iter()
                .filter(|item| self.table.has_selection(&to_selection(item.id)))
                .min_by(|a, b| a.name.cmp(&b.name))
                .map(|item| to_selection(item.id))
        };
        first_by_name(&self.impacts, Selection::Impact).or_else(|| first_by_name(&self.flows, Selection::Flow))
    }

    pub fn process_name(&self, id: ProcessId) -> String {
        self.process_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("process {}", id))
    }

    pub fn selection_name(&self, selection: &Selection) -> String {
        let (items, id) = match selection {
            Selection::Flow(id) => (&self.flows, id),
            Selection::Impact(id) => (&self.impacts, id),
        };
        items
            .iter()
            .find(|item| item.id == *id)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| selection.to_string())
    }
}
