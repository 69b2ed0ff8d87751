// Application state for HTTP handlers
use crate::application::envelope_service::EnvelopeService;
use crate::application::streaming_service::StreamingChartService;

#[derive(Clone)]
pub struct AppState {
    pub envelope_service: EnvelopeService,
    pub streaming_service: StreamingChartService,
}
