//! Process table sampler.

use async_trait::async_trait;
use hostwatch_adapters::process::ProcessTable;
use hostwatch_adapters::AdapterError;
use hostwatch_types::{MetricKind, Sample};

use super::Sampler;

/// Samples one process metric (memory or CPU) from the process table.
#[derive(Debug, Clone)]
pub struct ProcessSampler {
    table: ProcessTable,
    kind: MetricKind,
    description: String,
}

impl ProcessSampler {
    /// Create a sampler for `kind`, which should be a process metric.
    pub fn new(table: ProcessTable, kind: MetricKind) -> Self {
        let description = format!("process: {} via {}", kind, table.program());
        Self {
            table,
            kind,
            description,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }
}

#[async_trait]
impl Sampler for ProcessSampler {
    async fn sample(&self) -> Result<Vec<Sample>, AdapterError> {
        self.table.snapshot(self.kind).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}
