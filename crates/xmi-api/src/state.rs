//! Shared state handed to every handler.

use std::sync::Arc;

use xmi_core::ConversionWorkflow;
use xmi_telemetry::Metrics;

const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024 * 1024;

/// Size limits applied to conversion uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum size of any single form field.
    pub max_field_bytes: usize,
}

impl UploadLimits {
    /// Limits with the given per-field cap.
    #[must_use]
    pub const fn new(max_field_bytes: usize) -> Self {
        Self { max_field_bytes }
    }

    /// Whole-body limit: both file fields at the cap plus room for text fields.
    #[must_use]
    pub const fn body_limit_bytes(&self) -> usize {
        self.max_field_bytes
            .saturating_mul(2)
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

/// Dependencies used by the HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Conversion pipeline.
    pub workflow: Arc<dyn ConversionWorkflow>,
    /// Metrics registry.
    pub telemetry: Metrics,
    /// Upload limits.
    pub limits: UploadLimits,
}

impl ApiState {
    /// Bundle handler dependencies.
    pub fn new(
        workflow: Arc<dyn ConversionWorkflow>,
        telemetry: Metrics,
        limits: UploadLimits,
    ) -> Self {
        Self {
            workflow,
            telemetry,
            limits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_covers_both_files_plus_overhead() {
        let limits = UploadLimits::new(300 * 1024 * 1024);
        assert_eq!(limits.body_limit_bytes(), 616 * 1024 * 1024);
        assert_eq!(UploadLimits::new(usize::MAX).body_limit_bytes(), usize::MAX);
    }
}
