pub mod logger;

use chrono::Local;

/// 当前本地时间，格式 `HH:MM:SS.mmm`
pub fn current_timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate_string("abc", 5), "abc");
        assert_eq!(truncate_string("abcdef", 4), "abc…");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_string("代理服务器状态", 3), "代理…");
    }
}
