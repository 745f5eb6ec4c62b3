//! 설치 화면 문구를 터미널 너비에 맞추는 함수들

use std::path::Path;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// 상태 문구 한 줄 최대 너비
pub const STATUS_LINE_WIDTH: usize = 55;

const MARKER: &str = "...";

/// 상태 문구를 대문자로 바꾸고, 넘치면 끝을 잘라 `...`을 붙인다.
pub fn fit_status_line(text: &str, max_width: usize) -> String {
    let line = if text.width() <= max_width {
        text.to_string()
    } else {
        let keep = max_width.saturating_sub(MARKER.width() - 1);
        format!("{}{}", leading(text, keep), MARKER)
    };
    line.to_uppercase()
}

/// 로그 한 줄: 엔트리 이름 앞부분을 남기고 넘치는 끝을 생략
pub fn fit_log_line(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= MARKER.width() {
        return leading(text, max_width);
    }
    format!("{}{}", leading(text, max_width - MARKER.width()), MARKER)
}

/// 설치 위치: 설치 폴더 이름이 보이도록 경로 앞쪽을 생략
pub fn fit_destination(path: &Path, max_width: usize) -> String {
    let text = path.display().to_string();
    if text.width() <= max_width {
        return text;
    }
    if max_width <= MARKER.width() {
        return trailing(&text, max_width);
    }
    format!("{}{}", MARKER, trailing(&text, max_width - MARKER.width()))
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

fn leading(text: &str, max_width: usize) -> String {
    let mut width = 0;
    text.chars()
        .take_while(|ch| {
            width += char_width(*ch);
            width <= max_width
        })
        .collect()
}

fn trailing(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let kept: Vec<char> = text
        .chars()
        .rev()
        .take_while(|ch| {
            width += char_width(*ch);
            width <= max_width
        })
        .collect();
    kept.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_fit_status_line() {
        assert_eq!(fit_status_line("installing a.txt", 55), "INSTALLING A.TXT");
        let long = "x".repeat(80);
        let fitted = fit_status_line(&long, 55);
        assert_eq!(fitted.len(), 56);
        assert!(fitted.ends_with("..."));
    }

    #[test]
    fn test_fit_log_line() {
        assert_eq!(fit_log_line("INSTALLING files/a.txt", 40), "INSTALLING files/a.txt");
        assert_eq!(fit_log_line("INSTALLING files/levels/forest.map", 16), "INSTALLING fi...");
        assert_eq!(fit_log_line("INSTALLING", 2), "IN");
    }

    #[test]
    fn test_fit_log_line_wide_characters() {
        let fitted = fit_log_line("INSTALLING 맵/숲/나무.txt", 18);
        assert!(fitted.width() <= 18, "fitted={}", fitted);
        assert!(fitted.ends_with(MARKER));
    }

    #[test]
    fn test_fit_destination_keeps_install_folder() {
        let short = PathBuf::from("/tmp/app");
        assert_eq!(fit_destination(&short, 20), "/tmp/app");

        let long = PathBuf::from("/home/player/Desktop/workspace/games/textgame");
        let fitted = fit_destination(&long, 18);
        assert_eq!(fitted, ".../games/textgame");
        assert!(fitted.width() <= 18);
    }
}
