use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::chart_parser::{self, ChartPoint};
use crate::config::Config;
use crate::fetch_error::FetchError;
use crate::station_detail_parser::{self, DetailEntry};
use crate::station_list_parser::{self, StationRecord};
use crate::utils;

/// Result of a station detail lookup
///
/// A failed detail fetch serializes as `{}` while a fetched page always
/// serializes as an array, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StationDetail {
    Entries(Vec<DetailEntry>),
    Unavailable(Unavailable),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Unavailable {}

impl StationDetail {
    pub fn entries(&self) -> &[DetailEntry] {
        match self {
            StationDetail::Entries(entries) => entries,
            StationDetail::Unavailable(_) => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StationDetail::Unavailable(_))
    }
}

/// Client for the SAIH Duero public site
///
/// Each operation performs its GETs in sequence and never retries. The
/// infallible operations absorb every failure into an empty result; the
/// `try_` variants expose the reason.
#[derive(Clone)]
pub struct SaihFetcher {
    client: reqwest::Client,
    base_url: String,
    station_list_url: String,
}

impl SaihFetcher {
    pub fn new(base_url: String, station_list_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            station_list_url,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            station_list_url: config.station_list_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Detail page URL; the ID is escaped so it stays a single path segment
    pub fn station_url(&self, station_id: &str) -> Result<String, FetchError> {
        // "%2E" still counts as a dot segment once the URL is parsed
        if station_id.is_empty() || station_id.chars().all(|c| c == '.') {
            return Err(FetchError::InvalidStationId(station_id.to_string()));
        }
        let segment = utf8_percent_encode(station_id, NON_ALPHANUMERIC);
        Ok(utils::join_url(&self.base_url, &format!("risr/{segment}")))
    }

    /// All flow-gauging stations from the listing page
    pub async fn list_all_stations(&self) -> Vec<StationRecord> {
        self.try_list_all_stations().await.unwrap_or_else(|e| {
            log_failure("Error fetching stations", &e);
            Vec::new()
        })
    }

    #[instrument(skip(self), fields(url = %self.station_list_url))]
    pub async fn try_list_all_stations(&self) -> Result<Vec<StationRecord>, FetchError> {
        let html = self.fetch_html(&self.station_list_url).await?;
        let stations = station_list_parser::try_parse_stations(&html)?;
        info!("Fetched {} Aforo stations", stations.len());
        Ok(stations)
    }

    /// Metrics offered by a station, or `Unavailable` when the page could not be fetched
    pub async fn get_station_detail(&self, station_id: &str) -> StationDetail {
        match self.try_get_station_detail(station_id).await {
            Ok(entries) => StationDetail::Entries(entries),
            Err(e) => {
                log_failure("Error fetching station detail", &e);
                StationDetail::Unavailable(Unavailable {})
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn try_get_station_detail(
        &self,
        station_id: &str,
    ) -> Result<Vec<DetailEntry>, FetchError> {
        let html = self.fetch_html(&self.station_url(station_id)?).await?;
        let entries = station_detail_parser::parse_station_detail_with_base(&html, &self.base_url);
        if entries.is_empty() {
            warn!("No historic metric links found for station {}", station_id);
        }
        Ok(entries)
    }

    /// Time series of one metric (e.g. "nivel", "caudal") of a station
    pub async fn get_station_series(&self, station_id: &str, metric_type: &str) -> Vec<ChartPoint> {
        self.try_get_station_series(station_id, metric_type)
            .await
            .unwrap_or_else(|e| {
                log_failure("Error fetching station series", &e);
                Vec::new()
            })
    }

    #[instrument(skip(self))]
    pub async fn try_get_station_series(
        &self,
        station_id: &str,
        metric_type: &str,
    ) -> Result<Vec<ChartPoint>, FetchError> {
        let entries = self.try_get_station_detail(station_id).await?;

        let wanted = metric_type.to_lowercase();
        let entry = entries
            .iter()
            .find(|entry| entry.metric_type == wanted)
            .ok_or_else(|| FetchError::MetricNotFound {
                station_id: station_id.to_string(),
                metric: metric_type.to_string(),
            })?;

        debug!("Found {} series at {}", wanted, entry.url);
        let html = self.fetch_html(&entry.url).await?;
        let points = chart_parser::try_parse_chart_series(&html)?;
        info!(
            "Fetched {} {} points for station {}",
            points.len(),
            wanted,
            station_id
        );
        Ok(points)
    }

    #[instrument(skip(self))]
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        debug!("Sending HTTP request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("Received HTTP response with status: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }

        let html = response.text().await?;
        debug!("Retrieved HTML content, size: {} bytes", html.len());
        Ok(html)
    }
}

fn log_failure(context: &str, e: &FetchError) {
    if e.is_structural() {
        warn!("{}: {}", context, e);
    } else {
        error!("{}: {}", context, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> SaihFetcher {
        SaihFetcher::new(
            "https://www.saihduero.es/".to_string(),
            "https://www.saihduero.es/resultados-risr?q=&tipo=TT".to_string(),
        )
    }

    #[test]
    fn test_station_url() {
        assert_eq!(
            fetcher().station_url("EA013").unwrap(),
            "https://www.saihduero.es/risr/EA013"
        );
    }

    #[test]
    fn test_station_url_escapes_path_characters() {
        assert_eq!(
            fetcher().station_url("../resultados-risr").unwrap(),
            "https://www.saihduero.es/risr/%2E%2E%2Fresultados%2Drisr"
        );
        assert_eq!(
            fetcher().station_url("EA013?x=1").unwrap(),
            "https://www.saihduero.es/risr/EA013%3Fx%3D1"
        );
    }

    #[test]
    fn test_station_url_rejects_dot_segments() {
        for id in ["", ".", ".."] {
            assert!(matches!(
                fetcher().station_url(id),
                Err(FetchError::InvalidStationId(_))
            ));
        }
    }

    #[test]
    fn test_unavailable_detail_serializes_as_empty_object() {
        let detail = StationDetail::Unavailable(Unavailable {});
        assert_eq!(serde_json::to_string(&detail).unwrap(), "{}");
        assert!(detail.entries().is_empty());
        assert!(detail.is_unavailable());
    }

    #[test]
    fn test_detail_entries_serialize_as_array() {
        let detail = StationDetail::Entries(vec![DetailEntry {
            metric_type: "nivel".to_string(),
            url: "https://www.saihduero.es/risr/EA013/historico/abc".to_string(),
        }]);
        assert_eq!(
            serde_json::to_string(&detail).unwrap(),
            r#"[{"type":"nivel","url":"https://www.saihduero.es/risr/EA013/historico/abc"}]"#
        );

        let empty = StationDetail::Entries(Vec::new());
        assert_eq!(serde_json::to_string(&empty).unwrap(), "[]");
    }

    #[test]
    fn test_from_config() {
        let config = Config::default();
        let fetcher = SaihFetcher::from_config(&config).unwrap();
        assert_eq!(fetcher.base_url(), "https://www.saihduero.es/");
    }
}
