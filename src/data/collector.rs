//! Remote launch data collector
//!
//! Pulls past launches from a SpaceX-style REST API and flattens the nested
//! per-launch sub-resources (first-stage core, payload list) into
//! [`LaunchRecord`]s. Sub-resource lookups that fail are logged and recorded
//! as unknown values; they never drop the launch itself.

use super::{parse_date, LandingType, LaunchRecord, LaunchSite, LaunchTable, Orbit};
use crate::error::{LandingError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spacexdata.com/v4".to_string(),
            timeout_secs: 30,
            user_agent: concat!("falcon-landing/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl CollectorConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// First-stage core entry of a launch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCore {
    pub core: Option<String>,
    pub gridfins: Option<bool>,
    pub reused: Option<bool>,
    pub legs: Option<bool>,
    pub landing_attempt: Option<bool>,
    pub landing_success: Option<bool>,
    pub landing_type: Option<String>,
    pub landpad: Option<String>,
}

/// A launch as returned by `/launches/past`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiLaunch {
    pub flight_number: Option<u32>,
    pub date_utc: Option<String>,
    pub launchpad: Option<String>,
    pub rocket: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub cores: Vec<ApiCore>,
    #[serde(default)]
    pub payloads: Vec<String>,
}

/// A payload as returned by `/payloads/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPayload {
    pub id: Option<String>,
    pub mass_kg: Option<f64>,
    pub orbit: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Named resource used to resolve launchpad and rocket ids
#[derive(Debug, Clone, Deserialize)]
struct ApiNamed {
    id: String,
    name: String,
}

/// Lookup tables resolved before normalization
#[derive(Debug, Clone, Default)]
pub struct ResolvedResources {
    pub payloads: HashMap<String, ApiPayload>,
    pub launchpads: HashMap<String, String>,
    pub rockets: HashMap<String, String>,
}

/// HTTP collector for the launch data service
pub struct LaunchCollector {
    client: reqwest::Client,
    config: CollectorConfig,
}

impl LaunchCollector {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| LandingError::ExternalSource(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url, path);
        debug!(url = %url, "GET");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        response
            .json::<T>()
            .await
            .map_err(|e| LandingError::ExternalSource(format!("malformed response from {}: {}", url, e)))
    }

    /// Fetch all past launches; a transport failure here is an error
    pub async fn fetch_launches(&self) -> Result<Vec<ApiLaunch>> {
        self.get_json("launches/past").await
    }

    pub async fn fetch_payload(&self, id: &str) -> Result<ApiPayload> {
        self.get_json(&format!("payloads/{}", id)).await
    }

    async fn fetch_names(&self, path: &str) -> HashMap<String, String> {
        match self.get_json::<Vec<ApiNamed>>(path).await {
            Ok(items) => items.into_iter().map(|n| (n.id, n.name)).collect(),
            Err(e) => {
                warn!(resource = path, error = %e, "Name lookup failed, keeping raw ids");
                HashMap::new()
            }
        }
    }

    /// Collect and normalize all past launches
    pub async fn collect(&self) -> Result<Vec<LaunchRecord>> {
        let launches = self.fetch_launches().await?;
        info!(launches = launches.len(), "Fetched past launches");

        let mut resources = ResolvedResources {
            launchpads: self.fetch_names("launchpads").await,
            rockets: self.fetch_names("rockets").await,
            ..Default::default()
        };

        let mut failed_payloads = 0usize;
        for launch in &launches {
            for id in &launch.payloads {
                if resources.payloads.contains_key(id) {
                    continue;
                }
                match self.fetch_payload(id).await {
                    Ok(payload) => {
                        resources.payloads.insert(id.clone(), payload);
                    }
                    Err(e) => {
                        failed_payloads += 1;
                        debug!(payload = %id, error = %e, "Payload lookup failed");
                    }
                }
            }
        }
        if failed_payloads > 0 {
            warn!(failed = failed_payloads, "Some payload lookups failed; their masses are unknown");
        }

        let records: Vec<LaunchRecord> = launches
            .iter()
            .filter_map(|launch| normalize_launch(launch, &resources))
            .collect();

        info!(
            records = records.len(),
            dropped = launches.len() - records.len(),
            "Normalized launch records"
        );
        Ok(records)
    }

    /// Collect into a table, degrading to an empty table on failure
    pub async fn collect_table_or_empty(&self) -> LaunchTable {
        let result = match self.collect().await {
            Ok(records) => LaunchTable::from_records(&records),
            Err(e) => Err(e),
        };
        match result {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Launch collection failed, continuing with an empty table");
                LaunchTable::empty()
            }
        }
    }
}

/// Flatten one API launch into a record.
///
/// Returns `None` when the launch has no flight number or no parsable date.
pub fn normalize_launch(launch: &ApiLaunch, resources: &ResolvedResources) -> Option<LaunchRecord> {
    let flight_number = launch.flight_number.filter(|n| *n > 0)?;
    let date = launch.date_utc.as_deref().and_then(parse_date)?;

    let core = launch.cores.first().cloned().unwrap_or_default();

    let launchpad = launch.launchpad.clone().unwrap_or_else(|| "Unknown".to_string());
    let launch_site = LaunchSite::from(
        resources.launchpads.get(&launchpad).cloned().unwrap_or(launchpad),
    );

    let rocket = launch.rocket.clone().unwrap_or_else(|| "Unknown".to_string());
    let rocket = resources.rockets.get(&rocket).cloned().unwrap_or(rocket);

    let landing_type = core
        .landing_type
        .as_deref()
        .map(|t| t.parse::<LandingType>().unwrap_or(LandingType::None))
        .unwrap_or_default();

    let found: Vec<&ApiPayload> = launch
        .payloads
        .iter()
        .filter_map(|id| resources.payloads.get(id))
        .collect();

    let payload_mass = if launch.payloads.is_empty() {
        Some(0.0)
    } else if found.is_empty() {
        None
    } else {
        Some(found.iter().filter_map(|p| p.mass_kg).sum())
    };

    let orbit = launch
        .payloads
        .first()
        .and_then(|id| resources.payloads.get(id))
        .and_then(|p| p.orbit.clone())
        .map(Orbit::from)
        .unwrap_or_else(|| Orbit::Other("Unknown".to_string()));

    let landing_attempt = core.landing_attempt.unwrap_or(false);

    Some(LaunchRecord {
        flight_number,
        date,
        launch_site,
        rocket,
        grid_fins: core.gridfins.unwrap_or(false),
        reused: core.reused.unwrap_or(false),
        legs: core.legs.unwrap_or(false),
        landing_attempt,
        landing_success: if landing_attempt { core.landing_success } else { None },
        landing_type,
        payload_count: launch.payloads.len() as u32,
        payload_mass,
        orbit,
    })
}
