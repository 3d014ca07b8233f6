mod http;
mod memory;
mod types;

pub use http::{HttpRecordClient, PROJECT_ID_HEADER, PUBLIC_KEY_HEADER};
pub use memory::{MemoryRecordClient, RECORD_NOT_FOUND};
pub use types::*;
