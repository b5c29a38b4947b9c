use anyhow::Result;
use log2::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::network::{build, BuildConfig, ContributionNetwork, ContributionOracle, LinkIndex, ProcessId, Selection};

/// Holds the network currently on display and replaces it with networks
/// built in the background.
///
/// The displayed network is shared read-only; an update builds a new one and
/// swaps the handle. When a newer update was requested meanwhile, the older
/// result is dropped.
pub struct SankeyView<O> {
    root: ProcessId,
    index: Arc<LinkIndex>,
    oracle: Arc<O>,
    max_node_count: Option<usize>,
    displayed: RwLock<Arc<ContributionNetwork>>,
    /// Number of updates requested so far
    requests: AtomicU64,
}

impl<O> SankeyView<O>
where
    O: ContributionOracle + Send + Sync + 'static,
{
    /// Creates the view with an initial network built on the calling thread
    pub fn new(
        root: ProcessId,
        index: Arc<LinkIndex>,
        oracle: Arc<O>,
        selection: Selection,
        config: BuildConfig,
    ) -> Self {
        let network = build(root, &selection, &config, oracle.as_ref(), &index);
        Self {
            root,
            index,
            oracle,
            max_node_count: config.max_node_count,
            displayed: RwLock::new(Arc::new(network)),
            requests: AtomicU64::new(0),
        }
    }

    /// The network on display
    pub async fn current(&self) -> Arc<ContributionNetwork> {
        self.displayed.read().await.clone()
    }

    /// Shows `selection` at `cutoff`.
    ///
    /// Returns `Ok(true)` when the displayed network was replaced and
    /// `Ok(false)` when the request was ignored (cutoff outside [0, 1]) or
    /// superseded by a later one.
    pub async fn update(&self, selection: Selection, cutoff: f64) -> Result<bool> {
        if !(0.0..=1.0).contains(&cutoff) {
            warn!("Ignoring cutoff {} outside of [0, 1]", cutoff);
            return Ok(false);
        }
        let ticket = self.requests.fetch_add(1, Ordering::SeqCst) + 1;

        let current = self.current().await;
        let index = Arc::clone(&self.index);
        let oracle = Arc::clone(&self.oracle);
        let root = self.root;
        let mut config = BuildConfig::new(cutoff);
        config.max_node_count = self.max_node_count;

        let network = tokio::task::spawn_blocking(move || {
            let pruned = if current.selection() == selection && current.root() == root {
                current.prune(cutoff)
            } else {
                None
            };
            match pruned {
                Some(network) => {
                    debug!("Derived cutoff {} from displayed network", cutoff);
                    network
                }
                None => build(root, &selection, &config, oracle.as_ref(), &index),
            }
        })
        .await?;

        let mut displayed = self.displayed.write().await;
        if self.requests.load(Ordering::SeqCst) != ticket {
            debug!("Dropping network for {} at {}, a newer update is pending", selection, cutoff);
            return Ok(false);
        }
        info!(
            "Showing {} at cutoff {}: {} nodes, {} links",
            selection,
            cutoff,
            network.node_count(),
            network.edge_count()
        );
        *displayed = Arc::new(network);
        Ok(true)
    }
}
