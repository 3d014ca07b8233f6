use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::core::{RecordClient, Result, ID_FIELD};
use super::types::{
    BatchResponse,
    DeletePayload,
    FetchParams,
    FieldRef,
    GetParams,
    ItemResult,
    Operator,
    RecordsPayload,
    Row,
    ServiceResponse,
    SortType,
    WhereClause,
};

pub const RECORD_NOT_FOUND: &str = "Record not found";

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, Row>,
    last_id: i64,
}

impl Table {
    fn insert(&mut self, mut row: Row) -> Row {
        self.last_id += 1;
        row.insert(ID_FIELD.to_string(), Value::from(self.last_id));
        self.rows.insert(self.last_id, row.clone());
        row
    }
}

/// 进程内的记录服务，用于测试和离线运行
#[derive(Default)]
pub struct MemoryRecordClient {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryRecordClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某个实体当前的记录数
    pub async fn count(&self, entity: &str) -> usize {
        self.tables
            .read()
            .await
            .get(entity)
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }
}

fn project(row: &Row, fields: &[FieldRef]) -> Row {
    if fields.is_empty() {
        return row.clone();
    }

    fields
        .iter()
        .filter_map(|field| {
            row.get(field.name())
                .map(|value| (field.name().to_string(), value.clone()))
        })
        .collect()
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn matches(row: &Row, clause: &WhereClause) -> bool {
    let value = row.get(&clause.field_name).unwrap_or(&Value::Null);
    let hit = match clause.operator {
        Operator::EqualTo => clause.values.iter().any(|expected| expected == value),
        Operator::HasValue => has_value(value),
    };

    hit == clause.include
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

// null 总是排在最后
fn compare_rows(a: &Row, b: &Row, field_name: &str, sort_type: SortType) -> Ordering {
    let a = a.get(field_name).unwrap_or(&Value::Null);
    let b = b.get(field_name).unwrap_or(&Value::Null);

    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = compare_values(a, b);
            match sort_type {
                SortType::Asc => ordering,
                SortType::Desc => ordering.reverse(),
            }
        }
    }
}

#[async_trait]
impl RecordClient for MemoryRecordClient {
    async fn fetch_records(&self, entity: &str, params: &FetchParams) -> Result<ServiceResponse<Vec<Row>>> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(entity) else {
            return Ok(ServiceResponse::ok(Some(Vec::new())));
        };

        let mut rows: Vec<&Row> = table.rows
            .values()
            .filter(|row| params.where_clauses.iter().all(|clause| matches(row, clause)))
            .collect();

        // 多个排序字段依次比较
        rows.sort_by(|a, b| {
            params.order_by
                .iter()
                .map(|order| compare_rows(a, b, &order.field_name, order.sort_type))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let (offset, limit) = match params.paging_info {
            Some(paging) => (paging.offset as usize, paging.limit as usize),
            None => (0, usize::MAX),
        };

        let rows = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(row, &params.fields))
            .collect();

        Ok(ServiceResponse::ok(Some(rows)))
    }

    async fn get_record_by_id(&self, entity: &str, id: i64, params: &GetParams) -> Result<ServiceResponse<Row>> {
        let tables = self.tables.read().await;
        let row = tables
            .get(entity)
            .and_then(|table| table.rows.get(&id))
            .map(|row| project(row, &params.fields));

        Ok(ServiceResponse::ok(row))
    }

    async fn create_record(&self, entity: &str, payload: &RecordsPayload) -> Result<BatchResponse> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.to_string()).or_default();

        let results = payload.records
            .iter()
            .map(|record| {
                let mut row = record.clone();
                row.remove(ID_FIELD);
                ItemResult::ok(Some(table.insert(row)))
            })
            .collect();

        Ok(BatchResponse::with_results(results))
    }

    async fn update_record(&self, entity: &str, payload: &RecordsPayload) -> Result<BatchResponse> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.to_string()).or_default();

        let results = payload.records
            .iter()
            .map(|record| {
                let Some(id) = record.get(ID_FIELD).and_then(Value::as_i64) else {
                    return ItemResult::failed("Id is required");
                };

                match table.rows.get_mut(&id) {
                    Some(row) => {
                        for (key, value) in record.iter().filter(|(key, _)| key.as_str() != ID_FIELD) {
                            row.insert(key.clone(), value.clone());
                        }
                        ItemResult::ok(Some(row.clone()))
                    }
                    None => ItemResult::failed(RECORD_NOT_FOUND),
                }
            })
            .collect();

        Ok(BatchResponse::with_results(results))
    }

    async fn delete_record(&self, entity: &str, payload: &DeletePayload) -> Result<BatchResponse> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.to_string()).or_default();

        let results = payload.record_ids
            .iter()
            .map(|id| match table.rows.remove(id) {
                Some(_) => ItemResult::ok(None),
                None => ItemResult::failed(RECORD_NOT_FOUND),
            })
            .collect();

        Ok(BatchResponse::with_results(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    async fn seed(client: &MemoryRecordClient, rows: Vec<Value>) {
        let payload = RecordsPayload {
            records: rows.into_iter().map(row).collect(),
        };
        client.create_record("upload_c", &payload).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let client = MemoryRecordClient::new();
        seed(&client, vec![json!({ "name_c": "a" }), json!({ "name_c": "b", "Id": 99 })]).await;

        let response = client.get_record_by_id("upload_c", 2, &GetParams::new(&["Id", "name_c"])).await.unwrap();
        assert_eq!(response.data.unwrap()["name_c"], "b");
        assert_eq!(client.count("upload_c").await, 2);
    }

    #[tokio::test]
    async fn test_fetch_filters_orders_and_pages() {
        let client = MemoryRecordClient::new();
        seed(&client, vec![
            json!({ "status_c": "completed", "uploaded_at_c": "2026-01-01T00:00:00.000Z" }),
            json!({ "status_c": "pending", "uploaded_at_c": null }),
            json!({ "status_c": "completed", "uploaded_at_c": "2026-03-01T00:00:00.000Z" }),
            json!({ "status_c": "completed", "uploaded_at_c": null }),
        ]).await;

        let params = FetchParams::new(&["Id"])
            .filter(WhereClause::equal_to("status_c", "completed"))
            .filter(WhereClause::has_value("uploaded_at_c"))
            .order_by("uploaded_at_c", SortType::Desc)
            .page(1, 0);

        let rows = client.fetch_records("upload_c", &params).await.unwrap().data.unwrap();
        assert_eq!(rows, vec![row(json!({ "Id": 3 }))]);
    }

    #[tokio::test]
    async fn test_order_by_id_desc() {
        let client = MemoryRecordClient::new();
        seed(&client, vec![json!({}), json!({}), json!({})]).await;

        let params = FetchParams::new(&["Id"]).order_by(ID_FIELD, SortType::Desc);
        let rows = client.fetch_records("upload_c", &params).await.unwrap().data.unwrap();
        let ids: Vec<i64> = rows.iter().map(|row| row[ID_FIELD].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_update_merges_and_reports_missing() {
        let client = MemoryRecordClient::new();
        seed(&client, vec![json!({ "name_c": "a", "progress_c": 0 })]).await;

        let payload = RecordsPayload {
            records: vec![
                row(json!({ "Id": 1, "progress_c": 40 })),
                row(json!({ "Id": 7, "progress_c": 40 })),
            ],
        };
        let response = client.update_record("upload_c", &payload).await.unwrap();
        let results = response.results.unwrap();

        assert!(results[0].success);
        let updated = results[0].data.as_ref().unwrap();
        assert_eq!(updated["name_c"], "a");
        assert_eq!(updated["progress_c"], 40);
        assert!(!results[1].success);
        assert_eq!(results[1].message.as_deref(), Some(RECORD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let client = MemoryRecordClient::new();
        seed(&client, vec![json!({ "name_c": "a" })]).await;

        let response = client.delete_record("upload_c", &DeletePayload { record_ids: vec![1, 2] }).await.unwrap();
        let results = response.results.unwrap();
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(client.count("upload_c").await, 0);
    }
}
