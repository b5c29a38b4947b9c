use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ProcessId = u64;
pub type FlowId = u64;
pub type ImpactId = u64;

/// Kind of process on the providing side of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[default]
    Process,
    WasteTreatment,
}

/// A process-to-process link of the product system.
///
/// Links are stored in supply-chain orientation: `provider` is always the
/// upstream side. For waste treatment the provider is the treatment process,
/// even though the waste itself moves from the consumer to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub provider: ProcessId,
    pub consumer: ProcessId,
    pub flow: FlowId,
    #[serde(default)]
    pub provider_type: ProviderType,
}

impl Link {
    pub fn new(provider: ProcessId, consumer: ProcessId, flow: FlowId) -> Self {
        Self {
            provider,
            consumer,
            flow,
            provider_type: ProviderType::Process,
        }
    }

    /// Link from a waste producing process to the process treating that waste
    pub fn waste(treatment: ProcessId, producer: ProcessId, flow: FlowId) -> Self {
        Self {
            provider: treatment,
            consumer: producer,
            flow,
            provider_type: ProviderType::WasteTreatment,
        }
    }
}

/// The quantity whose contributions are shown: a flow or an impact category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum Selection {
    Flow(FlowId),
    Impact(ImpactId),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Flow(id) => write!(f, "flow:{}", id),
            Selection::Impact(id) => write!(f, "impact:{}", id),
        }
    }
}

impl FromStr for Selection {
    type Err = anyhow::Error;

    /// Parses `flow:<id>` or `impact:<id>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("selection must look like flow:<id> or impact:<id>, got {}", s))?;
        let id: u64 = id.trim().parse()?;
        match kind.trim() {
            "flow" => Ok(Selection::Flow(id)),
            "impact" => Ok(Selection::Impact(id)),
            other => anyhow::bail!("unknown selection kind: {}", other),
        }
    }
}
