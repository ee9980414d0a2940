pub mod api;
pub mod chart_parser;
pub mod config;
pub mod fetch_error;
pub mod fetcher;
pub mod literal;
pub mod station_detail_parser;
pub mod station_list_parser;
pub mod timestamp;
pub mod utils;
