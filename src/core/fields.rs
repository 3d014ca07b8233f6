//! 字段映射表
//!
//! 调用方可以使用友好字段名（`name`、`uploadedAt`）或远端存储字段名
//! （`name_c`、`uploaded_at_c`）。同一字段两者同时出现时，存储字段名优先。

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use super::errors::{GatewayError, Result};
use super::types::{format_timestamp, UploadRecord, UploadStatus};

/// 远端实体名
pub const UPLOAD_ENTITY: &str = "upload_c";
pub const UPLOAD_SESSION_ENTITY: &str = "upload_session_c";

/// 主键字段不带后缀
pub const ID_FIELD: &str = "Id";

/// 自定义字段后缀
pub const CUSTOM_FIELD_SUFFIX: &str = "_c";

pub const SESSION_FILES_FIELD: &str = "files_c";
pub const SESSION_TOTAL_SIZE_FIELD: &str = "total_size_c";
pub const SESSION_STARTED_AT_FIELD: &str = "started_at_c";
pub const SESSION_COMPLETED_AT_FIELD: &str = "completed_at_c";

pub const SESSION_FIELDS: [&str; 5] = [
    ID_FIELD,
    SESSION_FILES_FIELD,
    SESSION_TOTAL_SIZE_FIELD,
    SESSION_STARTED_AT_FIELD,
    SESSION_COMPLETED_AT_FIELD,
];

/// 上传记录的逻辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadField {
    Name,
    Size,
    MimeType,
    Status,
    Progress,
    UploadedAt,
    Url,
}

impl UploadField {
    pub const ALL: [UploadField; 7] = [
        UploadField::Name,
        UploadField::Size,
        UploadField::MimeType,
        UploadField::Status,
        UploadField::Progress,
        UploadField::UploadedAt,
        UploadField::Url,
    ];

    pub fn friendly_name(self) -> &'static str {
        match self {
            UploadField::Name => "name",
            UploadField::Size => "size",
            UploadField::MimeType => "type",
            UploadField::Status => "status",
            UploadField::Progress => "progress",
            UploadField::UploadedAt => "uploadedAt",
            UploadField::Url => "url",
        }
    }

    pub fn storage_name(self) -> &'static str {
        match self {
            UploadField::Name => "name_c",
            UploadField::Size => "size_c",
            UploadField::MimeType => "type_c",
            UploadField::Status => "status_c",
            UploadField::Progress => "progress_c",
            UploadField::UploadedAt => "uploaded_at_c",
            UploadField::Url => "url_c",
        }
    }

    /// create 时缺省字段的默认值，没有默认值的字段不写入
    pub fn create_default(self) -> Option<Value> {
        match self {
            UploadField::Status => Some(Value::from(UploadStatus::Pending.as_str())),
            UploadField::Progress => Some(Value::from(0)),
            UploadField::UploadedAt | UploadField::Url => Some(Value::Null),
            _ => None,
        }
    }

    /// 写入前检查取值能否读回为 `UploadRecord`，null 总是允许
    pub fn check_value(self, value: &Value) -> Result<()> {
        let valid = match self {
            _ if value.is_null() => true,
            UploadField::Name | UploadField::MimeType | UploadField::Url => value.is_string(),
            UploadField::Size => value.is_u64(),
            UploadField::Status => value
                .as_str()
                .is_some_and(|status| status.parse::<UploadStatus>().is_ok()),
            UploadField::Progress => value.as_u64().is_some_and(|progress| progress <= 100),
            UploadField::UploadedAt => value
                .as_str()
                .is_some_and(|at| DateTime::parse_from_rfc3339(at).is_ok()),
        };

        if valid {
            Ok(())
        } else {
            Err(GatewayError::invalid_input(format!("Invalid {}: {}", self.friendly_name(), value)))
        }
    }

    /// `Id` 加上全部存储字段，用于查询
    pub fn query_fields() -> Vec<&'static str> {
        std::iter::once(ID_FIELD)
            .chain(Self::ALL.iter().map(|field| field.storage_name()))
            .collect()
    }
}

/// 松散类型的输入，键可以是友好字段名也可以是存储字段名
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadInput {
    values: Map<String, Value>,
}

impl UploadInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 写入任意键（友好名或存储名）
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn id(self, id: i64) -> Self {
        self.set(ID_FIELD, id)
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        let name: String = name.into();
        self.set(UploadField::Name.friendly_name(), name)
    }

    pub fn size(self, size: u64) -> Self {
        self.set(UploadField::Size.friendly_name(), size)
    }

    pub fn mime_type(self, mime_type: impl Into<String>) -> Self {
        let mime_type: String = mime_type.into();
        self.set(UploadField::MimeType.friendly_name(), mime_type)
    }

    pub fn status(self, status: UploadStatus) -> Self {
        self.set(UploadField::Status.friendly_name(), status.as_str())
    }

    pub fn progress(self, progress: u8) -> Self {
        self.set(UploadField::Progress.friendly_name(), progress)
    }

    pub fn uploaded_at(self, uploaded_at: Option<DateTime<Utc>>) -> Self {
        let value = uploaded_at.map(format_timestamp);
        self.set(UploadField::UploadedAt.friendly_name(), value)
    }

    pub fn url(self, url: Option<String>) -> Self {
        self.set(UploadField::Url.friendly_name(), url)
    }

    /// 按映射表取值：存储字段名优先，其次友好字段名。
    /// update 和会话统计都以此为准，冲突时存储字段名胜出；create 另外把空值回退到友好字段名。
    /// 显式的 null 也算存在。
    pub fn resolve(&self, field: UploadField) -> Option<&Value> {
        self.values
            .get(field.storage_name())
            .or_else(|| self.values.get(field.friendly_name()))
    }

    pub fn record_id(&self) -> Option<i64> {
        self.values.get(ID_FIELD).and_then(Value::as_i64)
    }

    /// 没有大小的文件按 0 计
    pub fn file_size(&self) -> u64 {
        self.resolve(UploadField::Size)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// create 请求的记录：null 和空字符串视为缺省并套用默认值
    pub(crate) fn to_create_row(&self) -> Result<Map<String, Value>> {
        let mut row = Map::new();
        for field in UploadField::ALL {
            let value = [field.storage_name(), field.friendly_name()]
                .into_iter()
                .filter_map(|key| self.values.get(key))
                .find(|value| !is_blank(value))
                .cloned()
                .or_else(|| field.create_default());

            if let Some(value) = value {
                field.check_value(&value)?;
                row.insert(field.storage_name().to_string(), value);
            }
        }
        Ok(row)
    }

    /// update 请求的记录：只包含显式给出的字段
    pub(crate) fn to_update_row(&self, id: i64) -> Result<Map<String, Value>> {
        let mut row = Map::new();
        row.insert(ID_FIELD.to_string(), Value::from(id));
        for field in UploadField::ALL {
            if let Some(value) = self.resolve(field) {
                field.check_value(value)?;
                row.insert(field.storage_name().to_string(), value.clone());
            }
        }
        Ok(row)
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str() == Some("")
}

impl From<Map<String, Value>> for UploadInput {
    fn from(values: Map<String, Value>) -> Self {
        Self::from_map(values)
    }
}

impl From<&UploadRecord> for UploadInput {
    fn from(record: &UploadRecord) -> Self {
        match serde_json::to_value(record) {
            Ok(Value::Object(values)) => Self::from_map(values),
            _ => Self::new().id(record.id).size(record.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> UploadInput {
        match value {
            Value::Object(map) => UploadInput::from_map(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_storage_names_carry_suffix() {
        for field in UploadField::ALL {
            assert!(field.storage_name().ends_with(CUSTOM_FIELD_SUFFIX));
        }
        assert!(!ID_FIELD.ends_with(CUSTOM_FIELD_SUFFIX));
    }

    #[test]
    fn test_record_serializes_with_storage_names() {
        let record = UploadRecord {
            id: 1,
            name: "a.png".to_string(),
            size: 10,
            mime_type: "image/png".to_string(),
            status: UploadStatus::Pending,
            progress: 0,
            uploaded_at: None,
            url: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();

        for field in UploadField::query_fields() {
            assert!(object.contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn test_raw_wins_over_friendly() {
        let input = input(json!({ "name": "friendly.txt", "name_c": "raw.txt" }));
        assert_eq!(input.resolve(UploadField::Name), Some(&json!("raw.txt")));
    }

    #[test]
    fn test_create_row_applies_defaults() {
        let row = UploadInput::new().name("a.csv").size(12).mime_type("text/csv").to_create_row().unwrap();

        assert_eq!(row["name_c"], "a.csv");
        assert_eq!(row["size_c"], 12);
        assert_eq!(row["type_c"], "text/csv");
        assert_eq!(row["status_c"], "pending");
        assert_eq!(row["progress_c"], 0);
        assert_eq!(row["uploaded_at_c"], Value::Null);
        assert_eq!(row["url_c"], Value::Null);
        assert!(!row.contains_key(ID_FIELD));
    }

    #[test]
    fn test_create_row_treats_null_as_absent() {
        let row = input(json!({ "status": null, "progress_c": null })).to_create_row().unwrap();
        assert_eq!(row["status_c"], "pending");
        assert_eq!(row["progress_c"], 0);
        assert!(!row.contains_key("name_c"));
    }

    #[test]
    fn test_create_row_raw_and_friendly_are_equivalent() {
        let friendly = input(json!({ "name": "a.json", "size": 5, "type": "application/json", "status": "uploading", "progress": 30 }));
        let raw = input(json!({ "name_c": "a.json", "size_c": 5, "type_c": "application/json", "status_c": "uploading", "progress_c": 30 }));

        assert_eq!(friendly.to_create_row().unwrap(), raw.to_create_row().unwrap());
    }

    #[test]
    fn test_create_row_treats_empty_status_as_absent() {
        let row = input(json!({ "name": "a.txt", "status": "", "status_c": "" })).to_create_row().unwrap();
        assert_eq!(row["status_c"], "pending");

        let row = input(json!({ "status_c": "", "status": "uploading" })).to_create_row().unwrap();
        assert_eq!(row["status_c"], "uploading");
    }

    #[test]
    fn test_create_row_rejects_unknown_status() {
        let err = input(json!({ "name": "a.txt", "status": "done" })).to_create_row().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(ref message) if message.contains("status")));
    }

    #[test]
    fn test_create_row_rejects_progress_out_of_range() {
        for progress in [json!(101), json!(-1), json!(12.5), json!("50")] {
            let err = input(json!({ "progress_c": progress })).to_create_row().unwrap_err();
            assert!(matches!(err, GatewayError::InvalidInput(_)));
        }
        assert!(input(json!({ "progress": 100 })).to_create_row().is_ok());
    }

    #[test]
    fn test_update_row_rejects_bad_values() {
        let err = input(json!({ "progress_c": 300 })).to_update_row(1).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(ref message) if message.contains("progress")));

        // update 不套用默认值，空字符串同样不是合法状态
        assert!(input(json!({ "status": "" })).to_update_row(1).is_err());
        assert!(input(json!({ "uploadedAt": "yesterday" })).to_update_row(1).is_err());
        assert!(input(json!({ "size": -4 })).to_update_row(1).is_err());
    }

    #[test]
    fn test_update_row_allows_null_and_known_values() {
        let row = input(json!({ "status": "error", "progress": 0, "uploadedAt": null, "url_c": null }))
            .to_update_row(1)
            .unwrap();
        assert_eq!(row["status_c"], "error");
        assert_eq!(row["uploaded_at_c"], Value::Null);
    }

    #[test]
    fn test_update_row_only_contains_given_fields() {
        let row = input(json!({ "progress": 50, "url_c": null, "unrelated": true })).to_update_row(4).unwrap();

        assert_eq!(row.len(), 3);
        assert_eq!(row[ID_FIELD], 4);
        assert_eq!(row["progress_c"], 50);
        assert_eq!(row["url_c"], Value::Null);
    }

    #[test]
    fn test_empty_update_row_is_id_only() {
        let row = UploadInput::new().to_update_row(9).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row[ID_FIELD], 9);
    }

    #[test]
    fn test_file_size_falls_back_to_raw_and_zero() {
        assert_eq!(input(json!({ "size": 3 })).file_size(), 3);
        assert_eq!(input(json!({ "size_c": 4 })).file_size(), 4);
        assert_eq!(input(json!({ "name": "x" })).file_size(), 0);
    }

    #[test]
    fn test_input_from_record_keeps_id_and_size() {
        let record = UploadRecord {
            id: 12,
            name: "b.gif".to_string(),
            size: 99,
            mime_type: "image/gif".to_string(),
            status: UploadStatus::Completed,
            progress: 100,
            uploaded_at: None,
            url: None,
        };
        let input = UploadInput::from(&record);
        assert_eq!(input.record_id(), Some(12));
        assert_eq!(input.file_size(), 99);
    }
}
