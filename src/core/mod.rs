mod errors;
mod fields;
mod traits;
mod types;

pub use errors::{GatewayError, Result};
pub use fields::{
    UploadField,
    UploadInput,
    CUSTOM_FIELD_SUFFIX,
    ID_FIELD,
    SESSION_COMPLETED_AT_FIELD,
    SESSION_FIELDS,
    SESSION_FILES_FIELD,
    SESSION_STARTED_AT_FIELD,
    SESSION_TOTAL_SIZE_FIELD,
    UPLOAD_ENTITY,
    UPLOAD_SESSION_ENTITY,
};
pub use traits::RecordClient;
pub use types::{
    format_timestamp,
    FileInfo,
    UploadRecord,
    UploadSession,
    UploadStatus,
};
pub(crate) use types::join_file_ids;
