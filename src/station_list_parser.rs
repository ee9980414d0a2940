use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, error, instrument, warn};

use crate::fetch_error::FetchError;
use crate::utils;

/// Value of the first column for flow-gauging stations
pub const AFORO: &str = "Aforo";

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#table-estaciones-pagination").expect("valid selector"));
static HEADER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead th").expect("valid selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("valid selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));

/// One row of the station listing, keyed by the table's own headers
///
/// Columns keep document order. Headers without a matching cell are absent
/// rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationRecord {
    columns: Vec<(String, String)>,
    pub station_id: Option<String>,
}

impl StationRecord {
    /// Set a column, replacing an earlier value under the same header
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(h, _)| *h == header) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

impl Serialize for StationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns: Vec<_> = self
            .columns
            .iter()
            .filter(|(h, _)| !(h == "stationId" && self.station_id.is_some()))
            .collect();

        let len = columns.len() + usize::from(self.station_id.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (header, value) in columns {
            map.serialize_entry(header, value)?;
        }
        if let Some(station_id) = &self.station_id {
            map.serialize_entry("stationId", station_id)?;
        }
        map.end()
    }
}

/// Parse the station listing, keeping only "Aforo" rows
///
/// Never fails: a missing table yields an empty list.
pub fn parse_stations(html: &str) -> Vec<StationRecord> {
    match try_parse_stations(html) {
        Ok(stations) => stations,
        Err(FetchError::TableNotFound) => {
            warn!("Station table not found");
            Vec::new()
        }
        Err(e) => {
            error!("Error parsing station list HTML: {}", e);
            Vec::new()
        }
    }
}

#[instrument(skip(html), fields(html_size = html.len()))]
pub fn try_parse_stations(html: &str) -> Result<Vec<StationRecord>, FetchError> {
    debug!("Parsing station list HTML");
    let document = Html::parse_document(html);

    let table = document
        .select(&TABLE_SELECTOR)
        .next()
        .ok_or(FetchError::TableNotFound)?;

    let headers: Vec<String> = table
        .select(&HEADER_SELECTOR)
        .map(|th| utils::element_text(&th))
        .collect();
    debug!("Station table headers: {:?}", headers);

    let mut stations = Vec::new();
    let mut row_count = 0;

    for row in table.select(&ROW_SELECTOR) {
        row_count += 1;
        let record = parse_row(&headers, &row);

        let kind = headers.first().and_then(|h| record.get(h));
        if kind == Some(AFORO) {
            stations.push(record);
        } else {
            debug!("Row {} discarded (first column {:?})", row_count, kind);
        }
    }

    debug!(
        "Kept {} Aforo stations out of {} rows",
        stations.len(),
        row_count
    );
    Ok(stations)
}

fn parse_row(headers: &[String], row: &ElementRef<'_>) -> StationRecord {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();

    let mut record = StationRecord::default();
    for (header, cell) in headers.iter().zip(cells.iter()) {
        record.insert(header.clone(), utils::element_text(cell));
    }

    record.station_id = cells
        .get(1)
        .and_then(|cell| cell.select(&LINK_SELECTOR).next())
        .and_then(|link| link.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(|href| utils::station_id_from_href(href).to_string());

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <table id="table-estaciones-pagination">
            <thead>
                <tr><th> Tipo </th><th>Descripción</th><th>Río</th><th>Provincia</th></tr>
            </thead>
            <tbody>
                <tr>
                    <td>Aforo</td>
                    <td><a href="risr/EA013">Aranda de Duero</a></td>
                    <td>Duero</td>
                    <td>Burgos</td>
                </tr>
                <tr>
                    <td>Embalse</td>
                    <td><a href="risr/EM001">Cuerda del Pozo</a></td>
                    <td>Duero</td>
                    <td>Soria</td>
                </tr>
                <tr>
                    <td>Aforo</td>
                    <td>Sin enlace</td>
                    <td>Pisuerga</td>
                </tr>
                <tr>
                    <td>aforo</td>
                    <td><a href="risr/EA999">Minúsculas</a></td>
                    <td>Esla</td>
                    <td>León</td>
                </tr>
            </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_stations_keeps_only_aforo() {
        let stations = parse_stations(LISTING);
        assert_eq!(stations.len(), 2);
        assert!(stations.iter().all(|s| s.get("Tipo") == Some("Aforo")));
    }

    #[test]
    fn test_parse_stations_maps_headers_to_cells() {
        let stations = parse_stations(LISTING);
        let first = &stations[0];
        assert_eq!(first.get("Descripción"), Some("Aranda de Duero"));
        assert_eq!(first.get("Río"), Some("Duero"));
        assert_eq!(first.get("Provincia"), Some("Burgos"));
        assert_eq!(first.station_id.as_deref(), Some("EA013"));
    }

    #[test]
    fn test_parse_stations_short_row_and_missing_link() {
        let stations = parse_stations(LISTING);
        let second = &stations[1];
        assert_eq!(second.get("Río"), Some("Pisuerga"));
        assert_eq!(second.get("Provincia"), None);
        assert_eq!(second.station_id, None);
    }

    #[test]
    fn test_parse_stations_missing_table() {
        let html = "<html><body><table class=\"stations\"><tr><td>Aforo</td></tr></table></body></html>";
        assert!(parse_stations(html).is_empty());
        assert!(matches!(
            try_parse_stations(html),
            Err(FetchError::TableNotFound)
        ));
    }

    #[test]
    fn test_parse_stations_without_headers_discards_rows() {
        let html = r#"<table id="table-estaciones-pagination"><tbody>
            <tr><td>Aforo</td><td><a href="risr/EA013">x</a></td></tr>
        </tbody></table>"#;
        assert!(parse_stations(html).is_empty());
    }

    #[test]
    fn test_parse_stations_empty_href_is_ignored() {
        let html = r#"<table id="table-estaciones-pagination">
            <thead><tr><th>Tipo</th><th>Descripción</th></tr></thead>
            <tbody><tr><td>Aforo</td><td><a href="">Sin destino</a></td></tr></tbody>
        </table>"#;
        let stations = parse_stations(html);
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, None);
    }

    #[test]
    fn test_station_record_serializes_in_header_order() {
        let stations = parse_stations(LISTING);
        let json = serde_json::to_string(&stations[0]).unwrap();
        assert_eq!(
            json,
            r#"{"Tipo":"Aforo","Descripción":"Aranda de Duero","Río":"Duero","Provincia":"Burgos","stationId":"EA013"}"#
        );
    }

    #[test]
    fn test_station_record_omits_absent_station_id() {
        let mut record = StationRecord::default();
        record.insert("Tipo", "Aforo");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Tipo":"Aforo"}"#);
    }

    #[test]
    fn test_station_record_insert_replaces_duplicate_header() {
        let mut record = StationRecord::default();
        record.insert("Río", "Duero");
        record.insert("Río", "Esgueva");
        assert_eq!(record.get("Río"), Some("Esgueva"));
        assert_eq!(record.columns().count(), 1);
    }

    #[test]
    fn test_parse_stations_is_repeatable() {
        assert_eq!(parse_stations(LISTING), parse_stations(LISTING));
    }
}
