use chrono::Utc;
use serde_json::{Map, Value};
use tracing::error;

use crate::core::{
    format_timestamp,
    join_file_ids,
    GatewayError,
    Result,
    UploadInput,
    UploadSession,
    ID_FIELD,
    SESSION_COMPLETED_AT_FIELD,
    SESSION_FIELDS,
    SESSION_FILES_FIELD,
    SESSION_STARTED_AT_FIELD,
    SESSION_TOTAL_SIZE_FIELD,
    UPLOAD_SESSION_ENTITY,
};
use crate::protocol::records::{GetParams, RecordsPayload, Row};
use super::{batch_outcome, decode, ensure_success, UploadGateway};

fn session_row(files: &[UploadInput]) -> Result<Row> {
    let file_ids = files
        .iter()
        .map(|file| {
            file.record_id()
                .ok_or_else(|| GatewayError::invalid_input("Every session file needs an integer Id"))
        })
        .collect::<Result<Vec<i64>>>()?;
    let total_size: u64 = files.iter().map(UploadInput::file_size).sum();

    let mut row = Map::new();
    row.insert(SESSION_FILES_FIELD.to_string(), Value::from(join_file_ids(&file_ids)));
    row.insert(SESSION_TOTAL_SIZE_FIELD.to_string(), Value::from(total_size));
    row.insert(SESSION_STARTED_AT_FIELD.to_string(), Value::from(format_timestamp(Utc::now())));
    row.insert(SESSION_COMPLETED_AT_FIELD.to_string(), Value::Null);
    Ok(row)
}

impl UploadGateway {
    /// 为一组已创建的上传记录开启会话
    pub async fn create_session(&self, files: &[UploadInput]) -> Result<Option<UploadSession>> {
        let row = session_row(files)
            .inspect_err(|err| error!(error = %err, "Error creating upload session"))?;
        let payload = RecordsPayload::single(row);

        self.client
            .create_record(UPLOAD_SESSION_ENTITY, &payload)
            .await
            .and_then(|response| batch_outcome(response)?.data.map(decode).transpose())
            .inspect_err(|err| error!(error = %err, "Error creating upload session"))
    }

    pub async fn get_session(&self, id: i64) -> Result<Option<UploadSession>> {
        let params = GetParams::new(&SESSION_FIELDS);

        self.client
            .get_record_by_id(UPLOAD_SESSION_ENTITY, id, &params)
            .await
            .and_then(|response| ensure_success(response)?.map(decode).transpose())
            .inspect_err(|err| error!(id, error = %err, "Error fetching upload session"))
    }

    /// 写入完成时间。完成时间只能写一次，且不早于开始时间。
    pub async fn complete_session(&self, id: i64) -> Result<UploadSession> {
        let mut session = self.get_session(id)
            .await?
            .ok_or(GatewayError::SessionNotFound(id))
            .inspect_err(|err| error!(id, error = %err, "Error completing upload session"))?;

        if session.completed_at.is_some() {
            let err = GatewayError::SessionAlreadyCompleted(id);
            error!(id, error = %err, "Error completing upload session");
            return Err(err);
        }

        let completed_at = Utc::now().max(session.started_at);
        let mut row = Map::new();
        row.insert(ID_FIELD.to_string(), Value::from(id));
        row.insert(SESSION_COMPLETED_AT_FIELD.to_string(), Value::from(format_timestamp(completed_at)));

        let outcome = self.client
            .update_record(UPLOAD_SESSION_ENTITY, &RecordsPayload::single(row))
            .await
            .and_then(batch_outcome)
            .inspect_err(|err| error!(id, error = %err, "Error completing upload session"))?;

        // 远端可能只返回更新过的字段，合并到已读取的会话上
        match outcome.data {
            Some(updated) => {
                let mut merged = match serde_json::to_value(&session)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                merged.extend(updated);
                decode(merged)
            }
            None => {
                session.completed_at = Some(completed_at);
                Ok(session)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(value: Value) -> UploadInput {
        UploadInput::from_map(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_session_row_sums_sizes_and_joins_ids() {
        let row = session_row(&[
            file(json!({ "Id": 4, "size": 100 })),
            file(json!({ "Id": 5, "size_c": 20 })),
            file(json!({ "Id": 9 })),
        ]).unwrap();

        assert_eq!(row[SESSION_FILES_FIELD], "4,5,9");
        assert_eq!(row[SESSION_TOTAL_SIZE_FIELD], 120);
        assert!(row[SESSION_STARTED_AT_FIELD].is_string());
        assert_eq!(row[SESSION_COMPLETED_AT_FIELD], Value::Null);
    }

    #[test]
    fn test_session_row_requires_ids() {
        let err = session_row(&[file(json!({ "size": 1 }))]).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_session_row() {
        let row = session_row(&[]).unwrap();
        assert_eq!(row[SESSION_FILES_FIELD], "");
        assert_eq!(row[SESSION_TOTAL_SIZE_FIELD], 0);
    }
}
