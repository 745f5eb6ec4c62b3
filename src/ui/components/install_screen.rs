// Install screen component - 설치 화면 컴포넌트
//
// 헤더, 설치 위치, 상태 문구, 최근 로그, 진행 게이지, 하단 키 안내

use crate::utils::formatter::format_progress;
use crate::utils::path_display::{
    fit_destination, fit_log_line, fit_status_line, STATUS_LINE_WIDTH,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};
use std::collections::VecDeque;
use std::path::PathBuf;

/// 화면에 남겨두는 최근 로그 줄 수
pub const LOG_CAPACITY: usize = 64;

/// 설치 화면 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenMode {
    /// 설치 시작 확인 대기
    #[default]
    Confirm,
    /// 설치 진행 중
    Progress,
    /// 완료, Enter 대기
    Finished,
}

/// 화면에 그릴 설치 상태
#[derive(Debug, Clone, Default)]
pub struct InstallView {
    pub mode: ScreenMode,
    pub destination: PathBuf,
    pub status: String,
    pub logs: VecDeque<String>,
    pub value: usize,
    pub maximum: usize,
}

impl InstallView {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            status: "STARTING INSTALLATION".to_string(),
            ..Self::default()
        }
    }

    pub fn push_log(&mut self, line: &str) {
        if self.logs.len() == LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(line.to_string());
        self.status = fit_status_line(line, STATUS_LINE_WIDTH);
    }

    pub fn set_status(&mut self, line: &str) {
        self.status = fit_status_line(line, STATUS_LINE_WIDTH);
    }

    pub fn ratio(&self) -> f64 {
        if self.maximum == 0 {
            return 0.0;
        }
        (self.value.min(self.maximum) as f64 / self.maximum as f64).clamp(0.0, 1.0)
    }
}

/// 설치 화면 컴포넌트
pub struct InstallScreen<'a> {
    view: &'a InstallView,
    /// 강조 색상 (헤더, 테두리)
    accent_color: Color,
    /// 배경색
    bg_color: Color,
    /// 전경색
    fg_color: Color,
    /// 흐린 텍스트 (로그)
    dim_color: Color,
}

impl<'a> InstallScreen<'a> {
    pub fn new(view: &'a InstallView) -> Self {
        Self {
            view,
            accent_color: Color::Rgb(255, 245, 104),
            bg_color: Color::Rgb(45, 48, 51),
            fg_color: Color::Rgb(212, 212, 212),
            dim_color: Color::Rgb(108, 110, 112),
        }
    }

    fn footer_text(&self) -> &'static str {
        match self.view.mode {
            ScreenMode::Confirm => " Begin installation? [y] yes  [n] no ",
            ScreenMode::Progress => " [Esc] cancel ",
            ScreenMode::Finished => " [Enter] finish ",
        }
    }
}

impl Widget for InstallScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(self.bg_color).fg(self.fg_color));

        let [header_area, destination_area, status_area, log_area, gauge_area, footer_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .areas(area);

        Paragraph::new(Line::from(Span::styled(
            "INSTALLER",
            Style::default()
                .fg(self.accent_color)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(header_area, buf);

        let destination_width = (destination_area.width as usize).saturating_sub(14);
        Paragraph::new(Line::from(vec![
            Span::styled(" destination: ", Style::default().fg(self.dim_color)),
            Span::raw(fit_destination(&self.view.destination, destination_width)),
        ]))
        .render(destination_area, buf);

        Paragraph::new(self.view.status.as_str())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.accent_color)),
            )
            .render(status_area, buf);

        // 아래쪽부터 채워 최신 로그가 항상 보이게
        let visible = log_area.height as usize;
        let line_width = (log_area.width as usize).saturating_sub(2);
        let lines: Vec<Line> = self
            .view
            .logs
            .iter()
            .skip(self.view.logs.len().saturating_sub(visible))
            .map(|line| {
                Line::from(Span::styled(
                    format!(" {}", fit_log_line(line, line_width)),
                    Style::default().fg(self.dim_color),
                ))
            })
            .collect();
        Paragraph::new(lines).render(log_area, buf);

        Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.accent_color))
                    .title(" progress "),
            )
            .gauge_style(Style::default().fg(self.accent_color).bg(self.bg_color))
            .ratio(self.view.ratio())
            .label(format_progress(self.view.value, self.view.maximum))
            .render(gauge_area, buf);

        Paragraph::new(self.footer_text())
            .style(Style::default().fg(self.accent_color))
            .alignment(Alignment::Center)
            .render(footer_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(view: &InstallView, width: u16, height: u16) -> String {
        let area = Rect {
            x: 0,
            y: 0,
            width,
            height,
        };
        let mut buf = Buffer::empty(area);
        InstallScreen::new(view).render(area, &mut buf);

        let mut rendered = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                if let Some(cell) = buf.cell((x, y)) {
                    rendered.push_str(cell.symbol());
                }
            }
            rendered.push('\n');
        }
        rendered
    }

    #[test]
    fn test_push_log_keeps_recent_lines() {
        let mut view = InstallView::new(PathBuf::from("/tmp/app"));
        for i in 0..(LOG_CAPACITY + 5) {
            view.push_log(&format!("installing file-{}", i));
        }
        assert_eq!(view.logs.len(), LOG_CAPACITY);
        assert_eq!(view.logs.front().map(String::as_str), Some("installing file-5"));
        assert_eq!(view.status, format!("INSTALLING FILE-{}", LOG_CAPACITY + 4));
    }

    #[test]
    fn test_ratio_bounds() {
        let mut view = InstallView::default();
        assert_eq!(view.ratio(), 0.0);
        view.maximum = 4;
        view.value = 2;
        assert_eq!(view.ratio(), 0.5);
        view.value = 9;
        assert_eq!(view.ratio(), 1.0);
    }

    #[test]
    fn test_render_confirm_screen() {
        let view = InstallView::new(PathBuf::from("/tmp/app"));
        let rendered = render_to_string(&view, 70, 14);
        assert!(rendered.contains("INSTALLER"), "rendered=\n{}", rendered);
        assert!(rendered.contains("STARTING INSTALLATION"), "rendered=\n{}", rendered);
        assert!(rendered.contains("Begin installation?"), "rendered=\n{}", rendered);
    }

    #[test]
    fn test_render_progress_screen() {
        let mut view = InstallView::new(PathBuf::from("/tmp/app"));
        view.mode = ScreenMode::Progress;
        view.maximum = 3;
        view.value = 1;
        view.push_log("INSTALLING files/a.txt");
        let rendered = render_to_string(&view, 70, 14);
        assert!(rendered.contains("INSTALLING FILES/A.TXT"), "rendered=\n{}", rendered);
        assert!(rendered.contains("[1/3]"), "rendered=\n{}", rendered);
        assert!(rendered.contains("[Esc] cancel"), "rendered=\n{}", rendered);
    }
}
