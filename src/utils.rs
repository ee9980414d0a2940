/// Shared helpers for the SAIH Duero HTML parsers
use scraper::ElementRef;

/// Extract the station ID from a station link
///
/// Station links end with the station code, e.g. `risr/EA013`. The last
/// `/`-delimited segment is returned as-is, so a trailing slash yields an
/// empty string.
///
/// # Examples
///
/// ```
/// use saih_duero_api::utils::station_id_from_href;
///
/// assert_eq!(station_id_from_href("risr/EA013"), "EA013");
/// assert_eq!(station_id_from_href("https://www.saihduero.es/risr/EA153"), "EA153");
/// assert_eq!(station_id_from_href("EA046"), "EA046");
/// ```
pub fn station_id_from_href(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}

/// Concatenated text content of an element, trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Join a site base URL and a relative href without doubling the slash
///
/// ```
/// use saih_duero_api::utils::join_url;
///
/// assert_eq!(join_url("https://www.saihduero.es/", "risr/EA013"), "https://www.saihduero.es/risr/EA013");
/// assert_eq!(join_url("https://www.saihduero.es", "risr/EA013"), "https://www.saihduero.es/risr/EA013");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
