// Infrastructure layer - External dependencies and adapters
pub mod append_only_cache;
pub mod chunked_json;
pub mod command_retriever;
pub mod config;
pub mod csv_series_source;
pub mod http_response;
pub mod http_retriever;
pub mod station_csv;
