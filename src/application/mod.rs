// Application layer - Fetch, resample and envelope use cases
pub mod envelope;
pub mod envelope_service;
pub mod grouping;
pub mod normalizer;
pub mod resampler;
pub mod retriever;
pub mod segmented_fetcher;
pub mod series_source;
pub mod streaming_service;
