use crate::core::{FileInfo, GatewayError, Result};
use super::UploadGateway;

/// 10MB，刚好等于上限的文件允许上传
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 10] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "text/csv",
    "application/json",
];

/// 先检查大小再检查类型，类型必须完全匹配
pub fn validate_file(file: &FileInfo) -> Result<bool> {
    if file.size > MAX_FILE_SIZE {
        return Err(GatewayError::FileTooLarge { size: file.size });
    }

    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(GatewayError::UnsupportedFileType(file.mime_type.clone()));
    }

    Ok(true)
}

impl UploadGateway {
    pub fn validate_file(&self, file: &FileInfo) -> Result<bool> {
        validate_file(file)
    }
}
