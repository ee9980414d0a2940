use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::DEFAULT_BASE_URL;
use crate::utils;

static HISTORIC_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/historico/"]"#).expect("valid selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static HISTORIC_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^risr/[A-Z0-9]+/historico/[A-Za-z0-9]+$").expect("valid regex")
});

/// A metric offered by a station together with its historic-data page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    /// Lowercased metric name, e.g. "nivel" or "caudal"
    #[serde(rename = "type")]
    pub metric_type: String,
    pub url: String,
}

/// Parse a station detail page against the public site base URL
pub fn parse_station_detail(html: &str) -> Vec<DetailEntry> {
    parse_station_detail_with_base(html, DEFAULT_BASE_URL)
}

/// Parse a station detail page, resolving historic links against `base_url`
///
/// Only links of the exact form `risr/<ID>/historico/<token>` that sit
/// inside a table row with a non-empty first cell produce an entry.
#[instrument(skip(html), fields(html_size = html.len()))]
pub fn parse_station_detail_with_base(html: &str, base_url: &str) -> Vec<DetailEntry> {
    debug!("Parsing station detail HTML");
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for link in document.select(&HISTORIC_LINK_SELECTOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        if !HISTORIC_HREF_RE.is_match(href) {
            debug!("Skipping historic link with unexpected shape: {}", href);
            continue;
        }

        let Some(row) = enclosing_row(&link) else {
            debug!("Historic link {} is not inside a table row", href);
            continue;
        };

        let metric_type = row
            .select(&CELL_SELECTOR)
            .next()
            .map(|cell| utils::element_text(&cell).to_lowercase())
            .unwrap_or_default();

        if metric_type.is_empty() {
            debug!("Historic link {} has no metric label", href);
            continue;
        }

        entries.push(DetailEntry {
            metric_type,
            url: utils::join_url(base_url, href),
        });
    }

    debug!("Found {} historic metric links", entries.len());
    entries
}

fn enclosing_row<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "tr")
}
