use std::env;

use crate::utils;

/// Public site root; historic links on detail pages are relative to it
pub const DEFAULT_BASE_URL: &str = "https://www.saihduero.es/";

/// Listing query filtered to flow-gauging control points
pub const STATION_LIST_PATH: &str = "resultados-risr?q=&tipo=TT";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub base_url: String,
    pub station_list_url: String,
    pub http_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let base_url = env::var("SAIH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let station_list_url = env::var("STATION_LIST_URL")
            .unwrap_or_else(|_| utils::join_url(&base_url, STATION_LIST_PATH));

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            base_url,
            station_list_url,
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            base_url: DEFAULT_BASE_URL.to_string(),
            station_list_url: format!("{DEFAULT_BASE_URL}{STATION_LIST_PATH}"),
            http_timeout_seconds: 30,
        }
    }
}
