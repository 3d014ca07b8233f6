use async_trait::async_trait;
use crate::protocol::records::{
    BatchResponse,
    DeletePayload,
    FetchParams,
    GetParams,
    RecordsPayload,
    Row,
    ServiceResponse,
};
use super::errors::Result;

/// 远端记录服务客户端 - 网关只通过这个接口访问远端
///
/// 返回 `Err` 表示传输层失败；远端业务失败通过响应里的 `success=false` 表达。
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// 按条件查询记录
    async fn fetch_records(&self, entity: &str, params: &FetchParams) -> Result<ServiceResponse<Vec<Row>>>;

    /// 按 ID 获取单条记录
    async fn get_record_by_id(&self, entity: &str, id: i64, params: &GetParams) -> Result<ServiceResponse<Row>>;

    /// 创建记录
    async fn create_record(&self, entity: &str, payload: &RecordsPayload) -> Result<BatchResponse>;

    /// 更新记录，每条记录必须带 `Id`
    async fn update_record(&self, entity: &str, payload: &RecordsPayload) -> Result<BatchResponse>;

    /// 删除记录
    async fn delete_record(&self, entity: &str, payload: &DeletePayload) -> Result<BatchResponse>;
}
