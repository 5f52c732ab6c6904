//! Shared, read-only request-handling state.

use plateserve_pipeline::{RecognitionPipeline, RequestValidator};

/// Collaborators every request handler needs. Nothing in here is mutated after startup.
pub struct ApiState {
    pub(crate) validator: RequestValidator,
    pub(crate) pipeline: RecognitionPipeline,
    pub(crate) max_upload_bytes: usize,
}

impl ApiState {
    /// Bundle the validator, pipeline, and upload limit.
    #[must_use]
    pub const fn new(
        validator: RequestValidator,
        pipeline: RecognitionPipeline,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            validator,
            pipeline,
            max_upload_bytes,
        }
    }
}
