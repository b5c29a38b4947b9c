/// Node limit the interactive view uses
pub const DEFAULT_MAX_NODE_COUNT: usize = 500;

/// Number of cutoff probes the estimator runs at most
pub const DEFAULT_MAX_PROBES: usize = 12;

/// Configuration of a single network build
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildConfig {
    /// Minimum share a link needs to be followed; 0 disables pruning
    pub cutoff: f64,
    /// Stop creating nodes once this many exist
    pub max_node_count: Option<usize>,
}

impl BuildConfig {
    pub fn new(cutoff: f64) -> Self {
        Self {
            cutoff: cutoff.clamp(0.0, 1.0),
            max_node_count: None,
        }
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_node_count(mut self, max_node_count: usize) -> Self {
        self.max_node_count = Some(max_node_count);
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.max_node_count = None;
        self
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Configuration of the cutoff search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    pub target_node_count: usize,
    /// Accepted distance between the produced and the wanted node count
    pub tolerance: usize,
    pub max_probes: usize,
    /// Node limit applied to every probe build
    pub max_node_count: Option<usize>,
}

impl EstimatorConfig {
    pub fn new(target_node_count: usize) -> Self {
        Self {
            target_node_count,
            tolerance: target_node_count / 10,
            max_probes: DEFAULT_MAX_PROBES,
            max_node_count: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_probes(mut self, max_probes: usize) -> Self {
        self.max_probes = max_probes;
        self
    }

    pub fn with_max_node_count(mut self, max_node_count: usize) -> Self {
        self.max_node_count = Some(max_node_count);
        self
    }
}
