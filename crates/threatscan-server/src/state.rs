use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use threatscan_classifiers::InferenceService;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Inference service holding the model bundle
    pub service: Arc<InferenceService>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: Arc<InferenceService>, metrics_handle: Option<PrometheusHandle>) -> Self {
        Self {
            service,
            metrics_handle,
        }
    }
}
