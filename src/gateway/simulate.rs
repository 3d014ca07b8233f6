use std::sync::Arc;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::core::{Result, UploadInput, UploadRecord, UploadStatus};
use super::UploadGateway;

/// 每一步持久化后回调当前进度
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// 每一步增加的进度
pub const PROGRESS_STEP: u8 = 10;

const COMPLETE: u8 = 100;

/// 完成后写入的文件地址
pub fn completed_url(id: i64) -> String {
    format!("/uploads/file_{}", id)
}

fn step_patch(id: i64, progress: u8) -> UploadInput {
    if progress == COMPLETE {
        UploadInput::new()
            .status(UploadStatus::Completed)
            .progress(progress)
            .uploaded_at(Some(Utc::now()))
            .url(Some(completed_url(id)))
    } else {
        UploadInput::new()
            .status(UploadStatus::Uploading)
            .progress(progress)
            .uploaded_at(None)
            .url(None)
    }
}

impl UploadGateway {
    /// 模拟上传：进度 0, 10, ..., 100，每一步先等待再写入远端。
    ///
    /// 任意一步失败时把记录标记为 `error`、进度归零，然后返回原始错误；
    /// 如果标记本身也失败，返回的是标记失败的错误。
    pub async fn simulate_upload(&self, id: i64, on_progress: Option<ProgressCallback>) -> Result<Option<UploadRecord>> {
        match self.run_simulation(id, on_progress.as_ref()).await {
            Ok(record) => Ok(record),
            Err(err) => {
                error!(id, error = %err, "Error simulating upload");

                let reset = UploadInput::new()
                    .status(UploadStatus::Error)
                    .progress(0);
                self.update(id, reset).await?;

                Err(err)
            }
        }
    }

    async fn run_simulation(&self, id: i64, on_progress: Option<&ProgressCallback>) -> Result<Option<UploadRecord>> {
        info!(id, "simulated upload started");

        for progress in (0..=COMPLETE).step_by(PROGRESS_STEP as usize) {
            sleep(self.options.tick_interval).await;

            self.update(id, step_patch(id, progress)).await?;
            debug!(id, progress, "simulated progress persisted");

            if let Some(callback) = on_progress {
                callback(progress);
            }
        }

        info!(id, "simulated upload completed");
        self.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use crate::core::UploadField;

    #[test]
    fn test_completed_url_is_derived_from_id() {
        assert_eq!(completed_url(42), "/uploads/file_42");
    }

    #[test]
    fn test_intermediate_step_clears_completion_fields() {
        let patch = step_patch(3, 40);
        assert_eq!(patch.resolve(UploadField::Status), Some(&Value::from("uploading")));
        assert_eq!(patch.resolve(UploadField::Progress), Some(&Value::from(40)));
        assert_eq!(patch.resolve(UploadField::UploadedAt), Some(&Value::Null));
        assert_eq!(patch.resolve(UploadField::Url), Some(&Value::Null));
    }

    #[test]
    fn test_final_step_stamps_completion() {
        let patch = step_patch(3, 100);
        assert_eq!(patch.resolve(UploadField::Status), Some(&Value::from("completed")));
        assert!(patch.resolve(UploadField::UploadedAt).is_some_and(Value::is_string));
        assert_eq!(patch.resolve(UploadField::Url), Some(&Value::from("/uploads/file_3")));
    }
}
