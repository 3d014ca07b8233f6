use crate::core::UploadRecord;

/// 格式化字节数
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const UNIT_SIZE: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= UNIT_SIZE && unit_index < UNITS.len() - 1 {
        size /= UNIT_SIZE;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// `[#####     ]  50%`
pub fn progress_bar(progress: u8, width: usize) -> String {
    let progress = progress.min(100);
    let filled = width * progress as usize / 100;

    format!("[{}{}] {:>3}%", "#".repeat(filled), " ".repeat(width - filled), progress)
}

/// 列表输出的一行
pub fn record_line(record: &UploadRecord) -> String {
    let uploaded_at = record.uploaded_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:>6}  {:<10} {:>3}%  {:>10}  {:<24} {}  {}",
        record.id,
        record.status,
        record.progress,
        format_bytes(record.size),
        record.mime_type,
        record.name,
        uploaded_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.00 MB");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[          ]   0%");
        assert_eq!(progress_bar(50, 10), "[#####     ]  50%");
        assert_eq!(progress_bar(100, 10), "[##########] 100%");
        assert_eq!(progress_bar(250, 4), "[####] 100%");
    }
}
