//! Weather sampler.

use async_trait::async_trait;
use hostwatch_adapters::weather::{WeatherClient, WeatherReport};
use hostwatch_adapters::AdapterError;
use hostwatch_types::Sample;

use super::{ReportSource, Sampler};

/// Samples temperature and precipitation for a fixed set of regions.
///
/// Regions are queried concurrently. A region that fails contributes no
/// samples; the call only fails when every region failed.
#[derive(Debug, Clone)]
pub struct WeatherSampler {
    client: WeatherClient,
    regions: Vec<String>,
    description: String,
}

impl WeatherSampler {
    pub fn new(client: WeatherClient, regions: Vec<String>) -> Self {
        let description = format!("weather: {} ({})", client.endpoint(), regions.join(", "));
        Self {
            client,
            regions,
            description,
        }
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }
}

#[async_trait]
impl Sampler for WeatherSampler {
    async fn sample(&self) -> Result<Vec<Sample>, AdapterError> {
        if self.regions.is_empty() {
            return Ok(Vec::new());
        }

        let reports = self.client.query_all(&self.regions).await;
        if reports.iter().all(|(_, report)| report.is_none()) {
            return Err(AdapterError::SourceUnavailable(format!(
                "no weather for any of {} regions",
                self.regions.len()
            )));
        }

        Ok(reports
            .iter()
            .filter_map(|(_, report)| report.as_ref())
            .flat_map(WeatherReport::samples)
            .collect())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[async_trait]
impl ReportSource for WeatherSampler {
    async fn reports(&self) -> Vec<(String, Option<WeatherReport>)> {
        self.client.query_all(&self.regions).await
    }
}
