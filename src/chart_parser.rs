use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, warn};

use crate::fetch_error::FetchError;
use crate::literal;
use crate::timestamp::{self, INVALID_TIMESTAMP};

/// Text that identifies the script block holding the series
pub const CHART_DATA_MARKER: &str = "var chartData = [";

/// Key added to every point with the UTC instant of `d`
pub const TIMESTAMP_FIELD: &str = "@timestamp";

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));
static CHART_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var chartData = (\[[\s\S]*?\]);").expect("valid regex"));

/// One element of a station's `chartData` array
///
/// Holds every field emitted by the site, in source order. `d` is the local
/// date string and `v` the measured value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChartPoint(Map<String, Value>);

impl ChartPoint {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn date(&self) -> Option<&str> {
        self.0.get("d").and_then(Value::as_str)
    }

    pub fn value(&self) -> Option<f64> {
        self.0.get("v").and_then(Value::as_f64)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.0.get(TIMESTAMP_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Attach `@timestamp`, leaving the source fields untouched
    fn enrich(mut self) -> Self {
        let normalized = match self.date().map(timestamp::normalize) {
            Some(Ok(ts)) => ts,
            Some(Err(e)) => {
                warn!("Chart point has unparseable date: {}", e);
                INVALID_TIMESTAMP.to_string()
            }
            None => {
                warn!("Chart point has no string \"d\" field");
                INVALID_TIMESTAMP.to_string()
            }
        };
        self.0
            .insert(TIMESTAMP_FIELD.to_string(), Value::String(normalized));
        self
    }
}

/// Parse the embedded `chartData` series of a historic-data page
///
/// Never fails: a missing declaration or an undecodable literal yields an
/// empty series.
pub fn parse_chart_series(html: &str) -> Vec<ChartPoint> {
    match try_parse_chart_series(html) {
        Ok(points) => points,
        Err(FetchError::ChartDataNotFound) => {
            warn!("chartData declaration not found");
            Vec::new()
        }
        Err(e) => {
            error!("Error parsing chartData: {}", e);
            Vec::new()
        }
    }
}

#[instrument(skip(html), fields(html_size = html.len()))]
pub fn try_parse_chart_series(html: &str) -> Result<Vec<ChartPoint>, FetchError> {
    debug!("Searching script blocks for chartData");
    let array_literal = extract_chart_literal(html).ok_or(FetchError::ChartDataNotFound)?;
    debug!("Extracted chartData literal, size: {} bytes", array_literal.len());

    let points: Vec<ChartPoint> = literal::decode_object_array(&array_literal)?
        .into_iter()
        .map(|fields| ChartPoint::new(fields).enrich())
        .collect();

    debug!("Decoded {} chart points", points.len());
    Ok(points)
}

/// Array literal assigned to `chartData` in the first script that declares it
pub fn extract_chart_literal(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(&SCRIPT_SELECTOR)
        .map(|script| script.text().collect::<String>())
        .filter(|content| content.contains(CHART_DATA_MARKER))
        .find_map(|content| {
            CHART_DATA_RE
                .captures(&content)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
}
