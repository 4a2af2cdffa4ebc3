use std::sync::Arc;

use crate::config::Config;
use crate::cv::store::CvStore;
use crate::extraction::ExtractionGateway;
use crate::render::{HtmlPreview, PdfExport};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// The one CV session this process serves.
    pub store: Arc<CvStore>,
    /// Pluggable extraction backend. Default: MistralGateway.
    pub gateway: Arc<dyn ExtractionGateway>,
    pub preview: Arc<HtmlPreview>,
    pub export: Arc<PdfExport>,
}
