use std::path::Path;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use super::errors::{GatewayError, Result};

// 远端字段可能为 null，按默认值处理
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 会话文件 ID 列表，传输时以逗号拼接
mod file_id_list {
    use super::*;
    use serde::de::Error;

    pub fn serialize<S>(ids: &[i64], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::join_file_ids(ids))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let joined = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        joined
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<i64>().map_err(D::Error::custom))
            .collect()
    }
}

pub(crate) fn join_file_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// 写入远端的时间格式，如 `2026-10-16T08:30:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 上传状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// 等待中
    #[default]
    Pending,
    /// 上传中
    Uploading,
    /// 已完成
    Completed,
    /// 失败
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Completed => "completed",
            UploadStatus::Error => "error",
        }
    }

    /// pending -> uploading -> completed，任意状态都可以进入 error，
    /// error 可以重新开始上传
    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        use UploadStatus::*;

        match (self, next) {
            (_, Error) => true,
            (Pending, Uploading) | (Error, Uploading) => true,
            (Uploading, Uploading) | (Uploading, Completed) => true,
            _ => false,
        }
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "uploading" => Ok(UploadStatus::Uploading),
            "completed" => Ok(UploadStatus::Completed),
            "error" => Ok(UploadStatus::Error),
            _ => Err(GatewayError::invalid_input(format!("Unknown upload status: {:?}", s))),
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// 上传记录，对应远端 `upload_c`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "name_c", default, deserialize_with = "nullable")]
    pub name: String,
    /// 文件大小（字节）
    #[serde(rename = "size_c", default, deserialize_with = "nullable")]
    pub size: u64,
    /// MIME 类型
    #[serde(rename = "type_c", default, deserialize_with = "nullable")]
    pub mime_type: String,
    #[serde(rename = "status_c", default, deserialize_with = "nullable")]
    pub status: UploadStatus,
    /// 0 - 100
    #[serde(rename = "progress_c", default, deserialize_with = "nullable")]
    pub progress: u8,
    #[serde(rename = "uploaded_at_c", default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(rename = "url_c", default)]
    pub url: Option<String>,
}

impl UploadRecord {
    pub fn is_completed(&self) -> bool {
        self.status == UploadStatus::Completed && self.uploaded_at.is_some()
    }
}

/// 上传会话，对应远端 `upload_session_c`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "files_c", default, with = "file_id_list")]
    pub file_ids: Vec<i64>,
    #[serde(rename = "total_size_c", default, deserialize_with = "nullable")]
    pub total_size: u64,
    #[serde(rename = "started_at_c")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "completed_at_c", default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// 待校验的本地文件描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }

    /// 从磁盘读取大小，按扩展名推断 MIME 类型
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(GatewayError::invalid_input(format!("{} is not a file", path.display())));
        }

        let name = path.file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| GatewayError::invalid_input(format!("Can't read file name of {}", path.display())))?;
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();

        Ok(Self::new(name, metadata.len(), mime_type.essence_str()))
    }
}
