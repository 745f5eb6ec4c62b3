//! 전체 화면 설치 UI (ratatui + crossterm)
//!
//! 설치 시작 확인, 진행 상황 표시, 완료 후 Enter 대기.
//! raw 모드에서는 Ctrl+C가 신호로 오지 않으므로 키 감시 스레드가 직접 취소 토큰을 건드린다.

use crate::core::cancel::CancellationToken;
use crate::ui::components::{InstallScreen, InstallView, ScreenMode};
use crate::ui::reporter::ProgressReporter;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

type Screen = Terminal<CrosstermBackend<Stdout>>;

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 키 입력 해석 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Confirm,
    Decline,
    Cancel,
    Dismiss,
    Ignore,
}

fn classify_key(key: &KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => KeyAction::Cancel,
        (_, KeyCode::Esc) => KeyAction::Cancel,
        (_, KeyCode::Enter) => KeyAction::Dismiss,
        (_, KeyCode::Char('y' | 'Y')) => KeyAction::Confirm,
        (_, KeyCode::Char('n' | 'N' | 'q')) => KeyAction::Decline,
        _ => KeyAction::Ignore,
    }
}

struct KeyWatcher {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// 전체 화면 리포터
///
/// `open`으로 터미널을 잡기 전까지는 상태만 갱신하고 화면은 그리지 않는다.
pub struct TerminalReporter {
    view: Arc<Mutex<InstallView>>,
    screen: Arc<Mutex<Option<Screen>>>,
    cancel: CancellationToken,
    watcher: Mutex<Option<KeyWatcher>>,
}

impl TerminalReporter {
    pub fn new(destination: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            view: Arc::new(Mutex::new(InstallView::new(destination))),
            screen: Arc::new(Mutex::new(None)),
            cancel,
            watcher: Mutex::new(None),
        }
    }

    /// raw 모드 + 대체 화면 진입
    pub fn open(&self) -> io::Result<()> {
        let mut screen = lock(&self.screen);
        if screen.is_some() {
            return Ok(());
        }

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        *screen = Some(terminal);
        drop(screen);

        redraw(&self.screen, &self.view);
        Ok(())
    }

    /// 완료 화면에서 Enter를 기다린 뒤 터미널 복구
    ///
    /// 설치가 완료되지 않았으면 기다리지 않는다.
    pub fn wait_for_dismiss(&self) {
        self.stop_watcher();

        let finished = lock(&self.view).mode == ScreenMode::Finished;
        if finished && lock(&self.screen).is_some() {
            redraw(&self.screen, &self.view);
            loop {
                match event::read() {
                    Ok(Event::Key(key)) => match classify_key(&key) {
                        KeyAction::Dismiss | KeyAction::Cancel | KeyAction::Decline => break,
                        _ => {}
                    },
                    Ok(Event::Resize(_, _)) => redraw(&self.screen, &self.view),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read key event");
                        break;
                    }
                }
            }
        }

        self.close();
    }

    /// 터미널 복구 (여러 번 호출 가능)
    pub fn close(&self) {
        let Some(mut terminal) = lock(&self.screen).take() else {
            return;
        };
        if let Err(e) = disable_raw_mode() {
            tracing::warn!(error = %e, "failed to disable raw mode");
        }
        if let Err(e) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::warn!(error = %e, "failed to leave alternate screen");
        }
        let _ = terminal.show_cursor();
    }

    #[cfg(test)]
    fn snapshot(&self) -> InstallView {
        lock(&self.view).clone()
    }

    fn read_confirmation(&self) -> bool {
        loop {
            match event::read() {
                Ok(Event::Key(key)) => match classify_key(&key) {
                    KeyAction::Confirm => return true,
                    KeyAction::Decline | KeyAction::Cancel => return false,
                    _ => {}
                },
                Ok(Event::Resize(_, _)) => redraw(&self.screen, &self.view),
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "failed to read confirmation key");
                    return false;
                }
            }
        }
    }

    fn start_watcher(&self) {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let cancel = self.cancel.clone();
        let screen = Arc::clone(&self.screen);
        let view = Arc::clone(&self.view);

        let spawned = thread::Builder::new()
            .name("key watcher".to_string())
            .spawn(move || {
                while !thread_stop.load(Ordering::SeqCst) {
                    match event::poll(KEY_POLL_INTERVAL) {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(e) => {
                            tracing::warn!(error = %e, "key polling stopped");
                            return;
                        }
                    }
                    match event::read() {
                        Ok(Event::Key(key)) if classify_key(&key) == KeyAction::Cancel => {
                            tracing::info!("cancel requested from keyboard");
                            cancel.cancel();
                        }
                        Ok(Event::Resize(_, _)) => redraw(&screen, &view),
                        _ => {}
                    }
                }
            });

        match spawned {
            Ok(handle) => *lock(&self.watcher) = Some(KeyWatcher { stop, handle }),
            Err(e) => tracing::warn!(error = %e, "failed to start key watcher"),
        }
    }

    fn stop_watcher(&self) {
        let Some(watcher) = lock(&self.watcher).take() else {
            return;
        };
        watcher.stop.store(true, Ordering::SeqCst);
        if watcher.handle.join().is_err() {
            tracing::warn!("key watcher thread panicked");
        }
    }

    fn update(&self, apply: impl FnOnce(&mut InstallView)) {
        apply(&mut lock(&self.view));
        redraw(&self.screen, &self.view);
    }
}

impl ProgressReporter for TerminalReporter {
    fn display(&self) -> bool {
        if lock(&self.screen).is_none() {
            tracing::error!("terminal is not open, cannot ask for confirmation");
            return false;
        }
        redraw(&self.screen, &self.view);

        let confirmed = self.read_confirmation();
        if confirmed {
            self.update(|view| view.mode = ScreenMode::Progress);
            self.start_watcher();
        }
        confirmed
    }

    fn log(&self, line: &str) {
        tracing::info!("{}", line);
        self.update(|view| view.push_log(line));
    }

    fn set_text(&self, line: &str) {
        self.update(|view| view.set_status(line));
    }

    fn set_maximum_progress(&self, value: usize) {
        self.update(|view| view.maximum = value);
    }

    fn increment_progress(&self, value: usize) {
        self.update(|view| view.value += value);
    }

    fn set_finishable(&self, enabled: bool) {
        self.update(|view| {
            view.mode = if enabled {
                ScreenMode::Finished
            } else {
                ScreenMode::Progress
            }
        });
    }
}

impl Drop for TerminalReporter {
    fn drop(&mut self) {
        self.stop_watcher();
        self.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn redraw(screen: &Mutex<Option<Screen>>, view: &Mutex<InstallView>) {
    let mut screen = lock(screen);
    let Some(terminal) = screen.as_mut() else {
        return;
    };
    let view = lock(view);
    if let Err(e) = terminal.draw(|frame| frame.render_widget(InstallScreen::new(&view), frame.area())) {
        tracing::warn!(error = %e, "failed to draw install screen");
    }
}
