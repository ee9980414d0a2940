#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {0} for {1}")]
    Status(u16, String),
    #[error("Station table not found in HTML")]
    TableNotFound,
    #[error("No chartData declaration found in any script block")]
    ChartDataNotFound,
    #[error("Failed to decode chartData literal: {0}")]
    ChartDataDecode(String),
    #[error("Failed to parse date/time: {0}")]
    DateTimeError(String),
    #[error("Invalid station ID: {0:?}")]
    InvalidStationId(String),
    #[error("Metric type \"{metric}\" not found for station {station_id}")]
    MetricNotFound { station_id: String, metric: String },
}

impl FetchError {
    /// Expected markup or data was absent; logged as a warning rather than an error
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FetchError::TableNotFound
                | FetchError::ChartDataNotFound
                | FetchError::MetricNotFound { .. }
                | FetchError::InvalidStationId(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(FetchError::TableNotFound.is_structural());
        assert!(FetchError::ChartDataNotFound.is_structural());
        assert!(FetchError::MetricNotFound {
            station_id: "EA013".to_string(),
            metric: "lluvia".to_string(),
        }
        .is_structural());
        assert!(FetchError::InvalidStationId("..".to_string()).is_structural());
        assert!(!FetchError::ChartDataDecode("bad".to_string()).is_structural());
        assert!(!FetchError::Status(503, "http://x".to_string()).is_structural());
    }

    #[test]
    fn test_metric_not_found_message() {
        let e = FetchError::MetricNotFound {
            station_id: "EA013".to_string(),
            metric: "lluvia".to_string(),
        };
        assert_eq!(e.to_string(), "Metric type \"lluvia\" not found for station EA013");
    }
}
