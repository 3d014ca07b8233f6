use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::core::{GatewayError, RecordClient, Result};
use super::types::{
    BatchResponse,
    DeletePayload,
    FetchParams,
    GetParams,
    RecordsPayload,
    Row,
    ServiceResponse,
};

pub const PROJECT_ID_HEADER: &str = "x-apper-project-id";
pub const PUBLIC_KEY_HEADER: &str = "x-apper-public-key";

#[derive(Serialize)]
struct GetRecordRequest<'a> {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(flatten)]
    params: &'a GetParams,
}

/// 基于 HTTP 的记录服务客户端
///
/// 每个操作对应 `POST {endpoint}/{entity}/{operation}`，请求体即操作参数。
#[derive(Debug, Clone)]
pub struct HttpRecordClient {
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
}

impl HttpRecordClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()?;

        Self::with_client(config, client)
    }

    /// 使用调用方构造好的 reqwest 客户端，超时等设置由调用方负责
    pub fn with_client(config: &Config, client: Client) -> Result<Self> {
        let endpoint = config.endpoint
            .as_deref()
            .ok_or_else(|| GatewayError::config(format!("{} must be set", crate::config::ENDPOINT_VAR)))?;

        Ok(Self {
            client,
            endpoint: Self::normalize_endpoint(endpoint)?,
            headers: Self::create_headers(config)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn create_headers(config: &Config) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(PROJECT_ID_HEADER, HeaderValue::from_str(&config.project_id)?);
        headers.insert(PUBLIC_KEY_HEADER, HeaderValue::from_str(&config.public_key)?);

        Ok(headers)
    }

    // join 需要以 `/` 结尾，否则最后一段路径会被替换
    fn normalize_endpoint(endpoint: &str) -> Result<Url> {
        let mut url = Url::parse(endpoint)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn operation_url(&self, entity: &str, operation: &str) -> Result<Url> {
        Ok(self.endpoint.join(&format!("{}/{}", entity, operation))?)
    }

    async fn post<B, T>(&self, entity: &str, operation: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.operation_url(entity, operation)?;
        debug!(%url, entity, operation, "record service request");

        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RecordClient for HttpRecordClient {
    async fn fetch_records(&self, entity: &str, params: &FetchParams) -> Result<ServiceResponse<Vec<Row>>> {
        self.post(entity, "fetchRecords", params).await
    }

    async fn get_record_by_id(&self, entity: &str, id: i64, params: &GetParams) -> Result<ServiceResponse<Row>> {
        self.post(entity, "getRecordById", &GetRecordRequest { id, params }).await
    }

    async fn create_record(&self, entity: &str, payload: &RecordsPayload) -> Result<BatchResponse> {
        self.post(entity, "createRecord", payload).await
    }

    async fn update_record(&self, entity: &str, payload: &RecordsPayload) -> Result<BatchResponse> {
        self.post(entity, "updateRecord", payload).await
    }

    async fn delete_record(&self, entity: &str, payload: &DeletePayload) -> Result<BatchResponse> {
        self.post(entity, "deleteRecord", payload).await
    }
}
