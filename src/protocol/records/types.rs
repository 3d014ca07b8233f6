use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 远端的一行记录
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

/// `{"field": {"Name": "Id"}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    pub field: FieldName,
}

impl FieldRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldName { name: name.into() },
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    HasValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhereClause {
    pub field_name: String,
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default = "default_include")]
    pub include: bool,
}

fn default_include() -> bool {
    true
}

impl WhereClause {
    pub fn equal_to(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.into(),
            operator: Operator::EqualTo,
            values: vec![value.into()],
            include: true,
        }
    }

    pub fn has_value(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            operator: Operator::HasValue,
            values: Vec::new(),
            include: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub sort_type: SortType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// fetchRecords 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub fields: Vec<FieldRef>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchParams {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            fields: fields.iter().map(|name| FieldRef::new(name.as_ref())).collect(),
            where_clauses: Vec::new(),
            order_by: Vec::new(),
            paging_info: None,
        }
    }

    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.where_clauses.push(clause);
        self
    }

    pub fn order_by(mut self, field_name: impl Into<String>, sort_type: SortType) -> Self {
        self.order_by.push(OrderBy {
            field_name: field_name.into(),
            sort_type,
        });
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }
}

/// getRecordById 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetParams {
    pub fields: Vec<FieldRef>,
}

impl GetParams {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            fields: fields.iter().map(|name| FieldRef::new(name.as_ref())).collect(),
        }
    }
}

/// createRecord / updateRecord 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsPayload {
    pub records: Vec<Row>,
}

impl RecordsPayload {
    pub fn single(row: Row) -> Self {
        Self { records: vec![row] }
    }
}

/// deleteRecord 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

/// fetchRecords / getRecordById 的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// 批量请求中单条记录的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Row>,
}

impl ItemResult {
    pub fn ok(data: Option<Row>) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// createRecord / updateRecord / deleteRecord 的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ItemResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Row>,
}

impl BatchResponse {
    pub fn with_results(results: Vec<ItemResult>) -> Self {
        Self {
            success: true,
            message: None,
            results: Some(results),
            data: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            results: None,
            data: None,
        }
    }
}
