// Lake telemetry - station fetch, cache and envelope pipeline
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
