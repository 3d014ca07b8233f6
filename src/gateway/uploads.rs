use tracing::{debug, error};

use crate::core::{
    Result,
    UploadField,
    UploadInput,
    UploadRecord,
    UploadStatus,
    ID_FIELD,
    UPLOAD_ENTITY,
};
use crate::protocol::records::{
    DeletePayload,
    FetchParams,
    GetParams,
    RecordsPayload,
    SortType,
    WhereClause,
};
use super::{batch_outcome, decode, ensure_success, UploadGateway};

impl UploadGateway {
    /// 按 ID 倒序返回第一页上传记录
    pub async fn list_all(&self) -> Result<Vec<UploadRecord>> {
        let params = FetchParams::new(&UploadField::query_fields())
            .order_by(ID_FIELD, SortType::Desc)
            .page(self.options.page_size, 0);

        self.fetch_uploads(&params)
            .await
            .inspect_err(|err| error!(error = %err, "Error fetching uploads"))
    }

    /// 已完成且有完成时间的记录，按完成时间倒序
    pub async fn get_history(&self) -> Result<Vec<UploadRecord>> {
        let uploaded_at = UploadField::UploadedAt.storage_name();
        let params = FetchParams::new(&UploadField::query_fields())
            .filter(WhereClause::equal_to(UploadField::Status.storage_name(), UploadStatus::Completed.as_str()))
            .filter(WhereClause::has_value(uploaded_at))
            .order_by(uploaded_at, SortType::Desc)
            .page(self.options.page_size, 0);

        self.fetch_uploads(&params)
            .await
            .inspect_err(|err| error!(error = %err, "Error fetching upload history"))
    }

    async fn fetch_uploads(&self, params: &FetchParams) -> Result<Vec<UploadRecord>> {
        let response = self.client.fetch_records(UPLOAD_ENTITY, params).await?;
        let rows = ensure_success(response)?.unwrap_or_default();
        debug!(count = rows.len(), "fetched upload records");

        rows.into_iter().map(decode).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<UploadRecord>> {
        let params = GetParams::new(&UploadField::query_fields());

        self.client
            .get_record_by_id(UPLOAD_ENTITY, id, &params)
            .await
            .and_then(|response| ensure_success(response)?.map(decode).transpose())
            .inspect_err(|err| error!(id, error = %err, "Error fetching upload"))
    }

    /// 创建上传记录，缺省字段使用默认值（pending / 0 / null / null）。
    /// 取值无法读回为 `UploadRecord` 时不会发出请求。
    pub async fn create(&self, input: UploadInput) -> Result<Option<UploadRecord>> {
        let payload = input.to_create_row()
            .map(RecordsPayload::single)
            .inspect_err(|err| error!(error = %err, "Error creating upload"))?;

        self.client
            .create_record(UPLOAD_ENTITY, &payload)
            .await
            .and_then(|response| batch_outcome(response)?.data.map(decode).transpose())
            .inspect_err(|err| error!(error = %err, "Error creating upload"))
    }

    /// 只写入 `partial` 中显式给出的字段
    pub async fn update(&self, id: i64, partial: UploadInput) -> Result<Option<UploadRecord>> {
        let payload = partial.to_update_row(id)
            .map(RecordsPayload::single)
            .inspect_err(|err| error!(id, error = %err, "Error updating upload"))?;

        self.client
            .update_record(UPLOAD_ENTITY, &payload)
            .await
            .and_then(|response| batch_outcome(response)?.data.map(decode).transpose())
            .inspect_err(|err| error!(id, error = %err, "Error updating upload"))
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let payload = DeletePayload { record_ids: vec![id] };

        let outcome = self.client
            .delete_record(UPLOAD_ENTITY, &payload)
            .await
            .and_then(batch_outcome)
            .inspect_err(|err| error!(id, error = %err, "Error deleting upload"))?;

        // 没有逐条结果时视为成功
        Ok(outcome.succeeded.is_none_or(|succeeded| succeeded > 0))
    }
}
