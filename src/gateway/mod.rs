//! 上传记录网关
//!
//! 对 `upload_c` / `upload_session_c` 的增删改查、模拟上传进度和文件校验。
//! 远端客户端由调用方注入，网关本身不持有任何可变状态。

mod sessions;
mod simulate;
mod uploads;
mod validate;

use std::sync::Arc;
use std::time::Duration;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::core::{GatewayError, RecordClient, Result};
use crate::protocol::records::{BatchResponse, HttpRecordClient, Row, ServiceResponse};

pub use simulate::{completed_url, ProgressCallback, PROGRESS_STEP};
pub use validate::{validate_file, ALLOWED_MIME_TYPES, MAX_FILE_SIZE};

/// 网关选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayOptions {
    /// 模拟上传每一步之前的等待时间
    pub tick_interval: Duration,
    /// 列表查询只取第一页
    pub page_size: u32,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(150),
            page_size: 100,
        }
    }
}

impl From<&Config> for GatewayOptions {
    fn from(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct UploadGateway {
    client: Arc<dyn RecordClient>,
    options: GatewayOptions,
}

impl UploadGateway {
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self::with_options(client, GatewayOptions::default())
    }

    pub fn with_options(client: Arc<dyn RecordClient>, options: GatewayOptions) -> Self {
        Self { client, options }
    }

    /// 使用 HTTP 客户端连接配置中的记录服务
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpRecordClient::new(config)?;
        Ok(Self::with_options(Arc::new(client), GatewayOptions::from(config)))
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }
}

/// 批量请求的结果
#[derive(Debug, Default)]
pub(crate) struct BatchOutcome {
    /// 第一条成功记录的数据，没有 results 时取响应的 data
    pub data: Option<Row>,
    /// 成功条数，响应没有 results 时为 None
    pub succeeded: Option<usize>,
}

pub(crate) fn ensure_success<T>(response: ServiceResponse<T>) -> Result<Option<T>> {
    if !response.success {
        return Err(GatewayError::Service(response.message.unwrap_or_default()));
    }
    Ok(response.data)
}

/// 只抛出第一条带消息的失败记录，已经成功的记录不会回滚
pub(crate) fn batch_outcome(response: BatchResponse) -> Result<BatchOutcome> {
    if !response.success {
        return Err(GatewayError::Service(response.message.unwrap_or_default()));
    }

    let Some(results) = response.results else {
        return Ok(BatchOutcome {
            data: response.data,
            succeeded: None,
        });
    };

    if let Some(message) = results
        .iter()
        .filter(|item| !item.success)
        .find_map(|item| item.message.clone())
    {
        return Err(GatewayError::Batch(message));
    }

    let mut successful = results.into_iter().filter(|item| item.success);
    let first = successful.next();
    let succeeded = first.as_ref().map_or(0, |_| 1 + successful.count());

    Ok(BatchOutcome {
        data: first.and_then(|item| item.data),
        succeeded: Some(succeeded),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::records::ItemResult;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_ensure_success_passes_service_message() {
        let err = ensure_success::<Vec<Row>>(ServiceResponse::failed("Invalid public key")).unwrap_err();
        assert!(matches!(err, GatewayError::Service(ref message) if message == "Invalid public key"));
    }

    #[test]
    fn test_batch_outcome_first_failure_wins() {
        let response = BatchResponse::with_results(vec![
            ItemResult::ok(Some(row(json!({ "Id": 1 })))),
            ItemResult::failed("first"),
            ItemResult::failed("second"),
        ]);

        let err = batch_outcome(response).unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn test_batch_outcome_ignores_failures_without_message() {
        let mut silent = ItemResult::failed("");
        silent.message = None;
        let response = BatchResponse::with_results(vec![silent, ItemResult::ok(Some(row(json!({ "Id": 2 }))))]);

        let outcome = batch_outcome(response).unwrap();
        assert_eq!(outcome.succeeded, Some(1));
        assert_eq!(outcome.data.unwrap()["Id"], 2);
    }

    #[test]
    fn test_batch_outcome_without_results_uses_data() {
        let response = BatchResponse {
            success: true,
            message: None,
            results: None,
            data: Some(row(json!({ "Id": 5 }))),
        };

        let outcome = batch_outcome(response).unwrap();
        assert_eq!(outcome.succeeded, None);
        assert_eq!(outcome.data.unwrap()["Id"], 5);
    }

    #[test]
    fn test_default_options() {
        let options = GatewayOptions::default();
        assert_eq!(options.tick_interval, Duration::from_millis(150));
        assert_eq!(options.page_size, 100);
    }
}
