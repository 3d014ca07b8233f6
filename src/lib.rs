pub mod config;
pub mod core;
pub mod gateway;
pub mod protocol;
pub mod utils;

// 重新导出核心类型
pub use self::core::{
    FileInfo,
    GatewayError,
    RecordClient,
    Result,
    UploadField,
    UploadInput,
    UploadRecord,
    UploadSession,
    UploadStatus,
};

pub use self::config::Config;

pub use self::gateway::{
    completed_url,
    validate_file,
    GatewayOptions,
    ProgressCallback,
    UploadGateway,
    ALLOWED_MIME_TYPES,
    MAX_FILE_SIZE,
};

// 重新导出客户端
pub use self::protocol::records::{HttpRecordClient, MemoryRecordClient};
