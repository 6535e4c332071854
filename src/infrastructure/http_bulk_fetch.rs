// HTTP bulk-fetch implementation against the dashboard backend
use crate::application::bulk_fetch::BulkFetch;
use crate::domain::telemetry::{
    parse_timestamp, DateRange, Deployment, PreloadBatch, SensorReading, SummaryStats, TimePoint,
};
use crate::infrastructure::config::BackendSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpBulkFetch {
    base_url: String,
    deployment: Deployment,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    #[serde(default, alias = "dados")]
    points: Vec<WirePoint>,
    #[serde(default, alias = "ultimo")]
    latest: Option<WirePoint>,
    #[serde(default, alias = "media_dia")]
    daily_avg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WirePoint {
    #[serde(default, alias = "sensor", alias = "sensorId")]
    sensor_id: Option<String>,
    #[serde(default, alias = "valor")]
    value: Option<f64>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default, alias = "atual")]
    current: Option<WirePoint>,
    #[serde(default, alias = "media_hoje")]
    daily_avg: Option<f64>,
    #[serde(default, alias = "qtd_hoje")]
    daily_count: Option<u64>,
    #[serde(default, alias = "media_periodo")]
    period_avg: Option<f64>,
    #[serde(default, alias = "qtd_periodo")]
    period_count: Option<u64>,
}

impl WirePoint {
    fn into_reading(self) -> Option<SensorReading> {
        let raw = self.timestamp?;
        match parse_timestamp(&raw) {
            Ok(timestamp) => Some(SensorReading::new(
                self.sensor_id,
                TimePoint::from_reading(timestamp, self.value),
            )),
            Err(e) => {
                tracing::warn!("Skipping bulk point: {}", e);
                None
            }
        }
    }
}

impl From<StatsResponse> for SummaryStats {
    fn from(stats: StatsResponse) -> Self {
        SummaryStats {
            current: stats
                .current
                .and_then(WirePoint::into_reading)
                .map(|r| r.point),
            daily_avg: stats.daily_avg,
            daily_count: stats.daily_count,
            period_avg: stats.period_avg,
            period_count: stats.period_count,
        }
    }
}

impl HttpBulkFetch {
    pub fn new(settings: &BackendSettings, deployment: Deployment) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            deployment,
            client,
        })
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.build_url(path, params);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to dashboard backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Backend request {} failed with status {}: {}", path, status, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse backend response for {}", path))
    }

    fn range_params(range: &DateRange) -> [(&'static str, String); 2] {
        [
            ("inicio", range.start.format("%Y-%m-%d").to_string()),
            ("fim", range.end.format("%Y-%m-%d").to_string()),
        ]
    }

    fn to_readings(points: Vec<WirePoint>) -> Vec<SensorReading> {
        points.into_iter().filter_map(WirePoint::into_reading).collect()
    }
}

#[async_trait]
impl BulkFetch for HttpBulkFetch {
    async fn preload(&self, limit: usize) -> Result<PreloadBatch> {
        match self.deployment {
            Deployment::Single => {
                let response: PointsResponse = self
                    .get_json("/dados_iniciais", &[("preload", limit.to_string())])
                    .await?;
                let summary = SummaryStats {
                    current: response
                        .latest
                        .and_then(WirePoint::into_reading)
                        .map(|r| r.point),
                    daily_avg: response.daily_avg,
                    ..SummaryStats::default()
                };
                Ok(PreloadBatch {
                    readings: Self::to_readings(response.points),
                    summary: Some(summary),
                })
            }
            Deployment::Multi => {
                let response: PointsResponse = self
                    .get_json("/calibragem_dados", &[("limite", limit.to_string())])
                    .await?;
                Ok(PreloadBatch {
                    readings: Self::to_readings(response.points),
                    summary: None,
                })
            }
        }
    }

    async fn filter_by_range(
        &self,
        range: &DateRange,
        sensor_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SensorReading>> {
        let mut params = vec![("limite", limit.to_string())];
        let path = match self.deployment {
            Deployment::Single => "/historico_intervalo",
            Deployment::Multi => {
                if let Some(sensor_id) = sensor_id {
                    params.push(("sensor", sensor_id.to_string()));
                }
                "/calibragem_dados"
            }
        };
        params.extend(Self::range_params(range));

        let response: PointsResponse = self.get_json(path, &params).await?;
        let readings = Self::to_readings(response.points);
        tracing::debug!("Filter returned {} readings", readings.len());
        Ok(readings)
    }

    async fn stats(&self, range: Option<&DateRange>) -> Result<SummaryStats> {
        let params = range.map(|r| Self::range_params(r).to_vec()).unwrap_or_default();
        let response: StatsResponse = self.get_json("/estatisticas", &params).await?;
        Ok(response.into())
    }
}
