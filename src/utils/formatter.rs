// Formatters - 아카이브 크기, 진행 카운터 포맷팅

const SIZE_UNITS: [&str; 3] = ["KB", "MB", "GB"];

/// 아카이브 사본 크기 표시 (`512 B`, `1.5 KB`, `3.5 MB`)
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, SIZE_UNITS[unit])
}

/// 진행 카운터 표시 (`[3/12]`)
pub fn format_progress(value: usize, maximum: usize) -> String {
    let width = maximum.to_string().len();
    format!("[{:>width$}/{}]", value.min(maximum), maximum, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3_670_016), "3.5 MB");
        assert_eq!(format_file_size(2_147_483_648), "2.0 GB");
    }

    #[test]
    fn test_format_file_size_stays_in_largest_unit() {
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120.0 GB");
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(format_progress(0, 3), "[0/3]");
        assert_eq!(format_progress(7, 12), "[ 7/12]");
        assert_eq!(format_progress(5, 4), "[4/4]");
    }
}
