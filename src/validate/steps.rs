//! Step-order validation (O001–O003).
//!
//! Each emitted job gets its own `StepOrderValidator`; the emitting pass
//! records sanitization, artifact-upload, and cleanup facts as it writes
//! steps, then validates once at the end of the job. Ordinals are assigned
//! in recording order and strictly increase. The context is discarded after
//! validation; nothing here is global.

use thiserror::Error;

use crate::error::CompilerError;

/// One recorded artifact fact: the emitting step, the paths it covers, and
/// its emission ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub step_name: String,
    pub paths: Vec<String>,
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingViolation {
    #[error(
        "artifact upload step '{upload}' (ordinal {upload_ordinal}) precedes sanitization step '{sanitize}' (ordinal {sanitize_ordinal})"
    )]
    UploadBeforeSanitize {
        upload: String,
        upload_ordinal: usize,
        sanitize: String,
        sanitize_ordinal: usize,
    },
    #[error("artifact upload step '{upload}' (ordinal {ordinal}) emitted but the job never sanitizes")]
    MissingSanitize { upload: String, ordinal: usize },
    #[error(
        "cleanup step '{cleanup}' (ordinal {cleanup_ordinal}) deletes '{path}' no later than upload step '{upload}' (ordinal {upload_ordinal})"
    )]
    CleanupBeforeUpload {
        cleanup: String,
        cleanup_ordinal: usize,
        upload: String,
        upload_ordinal: usize,
        path: String,
    },
}

impl OrderingViolation {
    pub fn code(&self) -> &'static str {
        match self {
            OrderingViolation::UploadBeforeSanitize { .. } => "O001",
            OrderingViolation::MissingSanitize { .. } => "O002",
            OrderingViolation::CleanupBeforeUpload { .. } => "O003",
        }
    }
}

pub struct StepOrderValidator {
    job_id: String,
    sanitize_required: bool,
    sanitize: Option<(String, usize)>,
    uploads: Vec<ArtifactRecord>,
    cleanups: Vec<ArtifactRecord>,
    next_ordinal: usize,
}

impl StepOrderValidator {
    pub fn new(job_id: impl Into<String>, sanitize_required: bool) -> Self {
        StepOrderValidator {
            job_id: job_id.into(),
            sanitize_required,
            sanitize: None,
            uploads: Vec::new(),
            cleanups: Vec::new(),
            next_ordinal: 0,
        }
    }

    fn bump(&mut self) -> usize {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    /// Record the job's sanitization/redaction step. The earliest record
    /// wins if called more than once.
    pub fn record_sanitization(&mut self, step_name: &str) {
        let ordinal = self.bump();
        if self.sanitize.is_none() {
            self.sanitize = Some((step_name.to_string(), ordinal));
        }
    }

    pub fn record_artifact_upload(&mut self, step_name: &str, paths: &[String]) {
        let ordinal = self.bump();
        self.uploads.push(ArtifactRecord {
            step_name: step_name.to_string(),
            paths: paths.to_vec(),
            ordinal,
        });
    }

    pub fn record_cleanup(&mut self, step_name: &str, paths: &[String]) {
        let ordinal = self.bump();
        self.cleanups.push(ArtifactRecord {
            step_name: step_name.to_string(),
            paths: paths.to_vec(),
            ordinal,
        });
    }

    /// Run all ordering rules. Returns all violations found.
    pub fn validate(&self) -> Vec<OrderingViolation> {
        let mut violations = Vec::new();

        // --- uploads must follow sanitization when the job sanitizes ---
        if self.sanitize_required {
            for upload in &self.uploads {
                match &self.sanitize {
                    None => violations.push(OrderingViolation::MissingSanitize {
                        upload: upload.step_name.clone(),
                        ordinal: upload.ordinal,
                    }),
                    Some((sanitize, sanitize_ordinal)) if upload.ordinal < *sanitize_ordinal => {
                        violations.push(OrderingViolation::UploadBeforeSanitize {
                            upload: upload.step_name.clone(),
                            upload_ordinal: upload.ordinal,
                            sanitize: sanitize.clone(),
                            sanitize_ordinal: *sanitize_ordinal,
                        });
                    }
                    _ => {}
                }
            }
        }

        // --- cleanup must come strictly after the upload covering a path ---
        for cleanup in &self.cleanups {
            for upload in &self.uploads {
                for path in &cleanup.paths {
                    if upload.paths.contains(path) && cleanup.ordinal <= upload.ordinal {
                        violations.push(OrderingViolation::CleanupBeforeUpload {
                            cleanup: cleanup.step_name.clone(),
                            cleanup_ordinal: cleanup.ordinal,
                            upload: upload.step_name.clone(),
                            upload_ordinal: upload.ordinal,
                            path: path.clone(),
                        });
                    }
                }
            }
        }

        violations
    }

    /// Validate and convert violations into compiler errors carrying the
    /// job identifier.
    pub fn finish(&self) -> Result<(), Vec<CompilerError>> {
        let violations = self.validate();
        if violations.is_empty() {
            return Ok(());
        }
        Err(violations
            .into_iter()
            .map(|v| CompilerError::order(v.code(), v.to_string(), Some(self.job_id.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn upload_then_cleanup_passes() {
        let mut v = StepOrderValidator::new("agent", false);
        v.record_artifact_upload("Upload engine output files", &paths(&["out.txt"]));
        v.record_cleanup("Clean up engine output files", &paths(&["out.txt"]));
        assert!(v.validate().is_empty());
    }

    #[test]
    fn cleanup_before_upload_violates() {
        let mut v = StepOrderValidator::new("agent", false);
        v.record_cleanup("Clean up engine output files", &paths(&["out.txt"]));
        v.record_artifact_upload("Upload engine output files", &paths(&["out.txt"]));
        let violations = v.validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code(), "O003");
        assert!(violations[0].to_string().contains("out.txt"));
    }

    #[test]
    fn disjoint_paths_do_not_interact() {
        let mut v = StepOrderValidator::new("agent", false);
        v.record_cleanup("Clean up engine output files", &paths(&["a.txt"]));
        v.record_artifact_upload("Upload engine output files", &paths(&["b.txt"]));
        assert!(v.validate().is_empty());
    }

    #[test]
    fn sanitize_before_upload_passes() {
        let mut v = StepOrderValidator::new("agent", true);
        v.record_sanitization("Redact secrets");
        v.record_artifact_upload("Upload safe outputs", &paths(&["safe.jsonl"]));
        assert!(v.validate().is_empty());
    }

    #[test]
    fn upload_before_sanitize_violates() {
        let mut v = StepOrderValidator::new("agent", true);
        v.record_artifact_upload("Upload safe outputs", &paths(&["safe.jsonl"]));
        v.record_sanitization("Redact secrets");
        let violations = v.validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code(), "O001");
    }

    #[test]
    fn missing_sanitize_violates_when_required() {
        let mut v = StepOrderValidator::new("agent", true);
        v.record_artifact_upload("Upload safe outputs", &paths(&["safe.jsonl"]));
        let violations = v.validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code(), "O002");
    }

    #[test]
    fn sanitize_not_required_no_violation() {
        let mut v = StepOrderValidator::new("create_issue", false);
        v.record_artifact_upload("Upload report", &paths(&["report.md"]));
        assert!(v.validate().is_empty());
    }

    #[test]
    fn ordinals_strictly_increase() {
        let mut v = StepOrderValidator::new("agent", true);
        v.record_sanitization("Redact secrets");
        v.record_artifact_upload("Upload A", &paths(&["a"]));
        v.record_cleanup("Clean A", &paths(&["a"]));
        assert_eq!(v.sanitize.as_ref().map(|(_, o)| *o), Some(0));
        assert_eq!(v.uploads[0].ordinal, 1);
        assert_eq!(v.cleanups[0].ordinal, 2);
    }

    #[test]
    fn finish_attaches_job_identifier() {
        let mut v = StepOrderValidator::new("agent", true);
        v.record_artifact_upload("Upload safe outputs", &paths(&["safe.jsonl"]));
        let errors = v.finish().unwrap_err();
        assert_eq!(errors[0].code, "O002");
        assert_eq!(errors[0].job.as_deref(), Some("agent"));
    }
}
