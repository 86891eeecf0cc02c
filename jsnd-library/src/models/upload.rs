//! Upload inputs and the bulk-upload report

use serde::Serialize;

/// One file submitted for upload
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    /// Client-supplied name (untrusted)
    pub filename: String,
    /// Client-declared size in bytes
    pub declared_size: u64,
    pub content: Vec<u8>,
}

impl UploadCandidate {
    /// Candidate whose declared size is the content length
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            declared_size: content.len() as u64,
            content,
        }
    }
}

/// Successfully stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedSound {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    pub content_type: String,
    /// Position in the submitted batch
    pub index: usize,
}

/// Rejected file and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub filename: String,
    pub error: String,
    /// Position in the submitted batch
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Partial,
    Failure,
}

/// Partial-success report for a bulk upload
#[derive(Debug, Clone, Serialize)]
pub struct BulkUploadReport {
    pub status: BatchStatus,
    pub total_files: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub successful_files: Vec<UploadedSound>,
    pub failed_files: Vec<FileFailure>,
    pub message: String,
}

impl BulkUploadReport {
    /// Classify a finished batch
    pub fn build(total_files: usize, successful_files: Vec<UploadedSound>, failed_files: Vec<FileFailure>) -> Self {
        let success_count = successful_files.len();
        let failure_count = failed_files.len();

        let (status, message) = if failure_count == 0 {
            (
                BatchStatus::Success,
                format!("All {} files uploaded successfully!", total_files),
            )
        } else if success_count > 0 {
            (
                BatchStatus::Partial,
                format!("{} of {} files uploaded successfully", success_count, total_files),
            )
        } else {
            (
                BatchStatus::Failure,
                "No files were uploaded successfully".to_string(),
            )
        };

        Self {
            status,
            total_files,
            success_count,
            failure_count,
            successful_files,
            failed_files,
            message,
        }
    }
}

/// Stored sound ready to serve
#[derive(Debug, Clone)]
pub struct SoundFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub original_name: String,
}
