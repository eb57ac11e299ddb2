//! Weather adapter for wttr.in-style endpoints.
//!
//! Each region is fetched with `GET {endpoint}/{region}?format=%t,%h,%w,%C,%p`,
//! which answers with a single comma-delimited line:
//!
//! ```text
//! +31°C,62%,↙11km/h,Partly cloudy,0.3mm
//! ```
//!
//! Fields are temperature, humidity, wind, condition and precipitation. The
//! precipitation field is optional; providers that report a probability
//! instead of an amount answer with a bare percentage (`50%`).

use std::fmt;
use std::time::Duration;

use futures_util::future::join_all;
use reqwest::Client;
use tracing::warn;

use hostwatch_types::{MetricKind, Sample};

use crate::AdapterError;

/// wttr.in format string: temperature, humidity, wind, condition, precipitation.
pub const WEATHER_FORMAT: &str = "%t,%h,%w,%C,%p";

/// Precipitation as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precipitation {
    /// Absolute amount in millimetres.
    Millimeters(f64),
    /// Probability as a fraction in `0.0..=1.0`.
    Chance(f64),
}

impl Precipitation {
    /// Parse a precipitation field.
    ///
    /// `2mm` and `0.1in` are absolute amounts (inches are converted to
    /// millimetres); `50%` is a probability and becomes `0.5`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        if let Some(pct) = raw.strip_suffix('%') {
            return parse_number(pct).map(|v| Precipitation::Chance(v / 100.0));
        }
        if let Some(mm) = raw.strip_suffix("mm") {
            return parse_number(mm).map(Precipitation::Millimeters);
        }
        if let Some(inches) = raw.strip_suffix("in") {
            return parse_number(inches).map(|v| Precipitation::Millimeters(v * 25.4));
        }

        None
    }

    /// The metric kind samples of this precipitation carry.
    pub fn kind(&self) -> MetricKind {
        match self {
            Precipitation::Millimeters(_) => MetricKind::Precipitation,
            Precipitation::Chance(_) => MetricKind::PrecipitationChance,
        }
    }

    /// The numeric value (millimetres or fraction).
    pub fn value(&self) -> f64 {
        match self {
            Precipitation::Millimeters(v) | Precipitation::Chance(v) => *v,
        }
    }
}

impl fmt::Display for Precipitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precipitation::Millimeters(mm) => write!(f, "{:.1}mm", mm),
            Precipitation::Chance(chance) => write!(f, "{:.0}%", chance * 100.0),
        }
    }
}

/// Current conditions for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub region: String,
    /// Temperature exactly as reported (e.g. `+31°C`).
    pub temperature: String,
    pub humidity: String,
    pub wind: String,
    pub condition: String,
    /// Temperature in °C, when the reported value could be read.
    pub temperature_c: Option<f64>,
    pub precipitation: Option<Precipitation>,
}

impl WeatherReport {
    /// The numeric samples carried by this report.
    pub fn samples(&self) -> Vec<Sample> {
        let mut samples = Vec::with_capacity(2);

        if let Some(temp) = self.temperature_c {
            samples.push(Sample::new(
                &self.region,
                &self.region,
                temp,
                MetricKind::Temperature,
            ));
        }
        if let Some(precipitation) = self.precipitation {
            samples.push(Sample::new(
                &self.region,
                &self.region,
                precipitation.value(),
                precipitation.kind(),
            ));
        }

        samples
    }

    /// Render the report as notification text.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Region: {}\nTemperature: {}\nHumidity: {}\nWind: {}\nCondition: {}",
            self.region, self.temperature, self.humidity, self.wind, self.condition
        );
        if let Some(precipitation) = self.precipitation {
            out.push_str(&format!("\nPrecipitation: {}", precipitation));
        }
        out
    }
}

/// Parse a comma-delimited weather reply for `region`.
pub fn parse_weather_reply(region: &str, reply: &str) -> Result<WeatherReport, AdapterError> {
    let fields: Vec<&str> = reply.trim().split(',').map(str::trim).collect();

    if !(4..=5).contains(&fields.len()) || fields[..4].iter().any(|f| f.is_empty()) {
        return Err(AdapterError::Parse(format!(
            "unexpected weather reply for {}: {:?}",
            region,
            reply.trim()
        )));
    }

    let precipitation = match fields.get(4) {
        Some(raw) => Some(Precipitation::parse(raw).ok_or_else(|| {
            AdapterError::Parse(format!(
                "invalid precipitation '{}' for {}",
                raw, region
            ))
        })?),
        None => None,
    };

    Ok(WeatherReport {
        region: region.to_string(),
        temperature: fields[0].to_string(),
        humidity: fields[1].to_string(),
        wind: fields[2].to_string(),
        condition: fields[3].to_string(),
        temperature_c: parse_temperature(fields[0]),
        precipitation,
    })
}

/// Read `+31°C`, `-4°C` or `88°F` as degrees Celsius.
fn parse_temperature(raw: &str) -> Option<f64> {
    if let Some(c) = raw.strip_suffix("°C") {
        return parse_number(c);
    }
    if let Some(f) = raw.strip_suffix("°F") {
        return parse_number(f).map(|f| (f - 32.0) * 5.0 / 9.0);
    }
    None
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// HTTP client for the weather endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    endpoint: String,
}

impl WeatherClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> WeatherClientBuilder {
        WeatherClientBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch current conditions for one region.
    pub async fn query(&self, region: &str) -> Result<WeatherReport, AdapterError> {
        let url = format!("{}/{}", self.endpoint, path_segment(region));

        let response = self
            .client
            .get(&url)
            .query(&[("format", WEATHER_FORMAT)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "weather endpoint returned status {} for {}",
                response.status(),
                region
            )));
        }

        let body = response.text().await?;

        parse_weather_reply(region, &body)
    }

    /// Fetch all regions concurrently.
    ///
    /// Results come back in the order of `regions`. A region that fails is
    /// logged and yields `None`; the others are unaffected.
    pub async fn query_all(&self, regions: &[String]) -> Vec<(String, Option<WeatherReport>)> {
        let results = join_all(regions.iter().map(|region| self.query(region))).await;

        regions
            .iter()
            .zip(results)
            .map(|(region, result)| {
                let report = match result {
                    Ok(report) => Some(report),
                    Err(e) => {
                        warn!(region = %region, error = %e, "weather query failed");
                        None
                    }
                };
                (region.clone(), report)
            })
            .collect()
    }
}

/// Builder for [`WeatherClient`].
#[derive(Debug, Default)]
pub struct WeatherClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl WeatherClientBuilder {
    /// Set the base URL (default: "https://wttr.in").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<WeatherClient, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "https://wttr.in".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(WeatherClient { client, endpoint })
    }
}

// Encode a region name for use as a single path segment
fn path_segment(s: &str) -> String {
    s.trim()
        .replace('%', "%25")
        .replace(' ', "%20")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('#', "%23")
}
