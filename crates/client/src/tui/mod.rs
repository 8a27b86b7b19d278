mod board;
mod screens;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use puck::{FrameState, Frontend, InputState, Score, ScoreScreen, Sound};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::input::KeyTracker;

pub use board::Labels;
pub use screens::{MAIN_MENU, MenuView, Screen, lobby_entries, single_player_entries};

/// How long a non-pause score screen stays up.
pub const SCORE_SCREEN_DURATION: Duration = Duration::from_secs(5);
const FLASH_DURATION: Duration = Duration::from_millis(200);
const KEY_POLL: Duration = Duration::from_millis(50);

pub fn is_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    keys: KeyTracker,
    enhanced_keys: bool,
    labels: Labels,
    last_frame: Option<FrameState>,
    flash: Option<(Sound, Instant)>,
    restored: bool,
}

impl Tui {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let enhanced_keys = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if enhanced_keys {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("key release events: {enhanced_keys}");

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            keys: KeyTracker::new(enhanced_keys),
            enhanced_keys,
            labels: Labels::default(),
            last_frame: None,
            flash: None,
            restored: false,
        })
    }

    pub fn draw_menu(&mut self, view: &MenuView) -> io::Result<()> {
        self.terminal.draw(|frame| screens::render(frame, view))?;
        Ok(())
    }

    /// Waits up to `timeout` for a key press.
    pub fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }

    pub fn menu_key(&mut self) -> io::Result<Option<KeyEvent>> {
        self.next_key(KEY_POLL)
    }

    /// Prepares a fresh board for the next session.
    pub fn start_game(&mut self, labels: Labels) -> io::Result<()> {
        self.labels = labels;
        self.last_frame = None;
        self.flash = None;
        self.keys.clear();
        self.terminal.clear()
    }

    pub fn end_game(&mut self) -> io::Result<()> {
        self.last_frame = None;
        self.keys.clear();
        self.terminal.clear()
    }

    fn draw_game(&mut self, overlay: Option<(ScoreScreen, Score)>) -> io::Result<()> {
        let Some(state) = self.last_frame else {
            return Ok(());
        };
        let flash = self
            .flash
            .filter(|(_, at)| at.elapsed() < FLASH_DURATION)
            .map(|(sound, _)| sound);
        let labels = &self.labels;

        self.terminal.draw(|frame| {
            board::render_board(frame, &state, labels, flash);
            if let Some((screen, score)) = overlay {
                board::render_score_screen(frame, screen, &score);
            }
        })?;
        Ok(())
    }

    pub fn restore_terminal(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        if self.enhanced_keys {
            execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
        }
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

impl Frontend for Tui {
    fn render_frame(&mut self, frame: &FrameState) {
        self.last_frame = Some(*frame);
        if let Err(e) = self.draw_game(None) {
            log::warn!("failed to draw frame: {e}");
        }
    }

    fn play_sound(&mut self, sound: Sound) {
        self.flash = Some((sound, Instant::now()));
    }

    fn poll_input(&mut self) -> InputState {
        let now = Instant::now();
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.keys.handle(key, now),
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("failed to read terminal event: {e}");
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) => {
                    log::warn!("failed to poll terminal events: {e}");
                    break;
                }
            }
        }
        self.keys.take_state(now)
    }

    fn show_score_screen(&mut self, screen: ScoreScreen, score: &Score) -> bool {
        if let Err(e) = self.draw_game(Some((screen, *score))) {
            log::warn!("failed to draw score screen: {e}");
        }

        let shown = Instant::now();
        let keep_playing = loop {
            if screen != ScoreScreen::Pause && shown.elapsed() >= SCORE_SCREEN_DURATION {
                break true;
            }
            match self.next_key(KEY_POLL) {
                Ok(Some(key)) if is_quit_key(&key) => break false,
                Ok(Some(key))
                    if screen == ScoreScreen::Pause
                        && matches!(key.code, KeyCode::Char('p') | KeyCode::Char('P')) =>
                {
                    break true;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("failed to read terminal event: {e}");
                    break false;
                }
            }
        };

        self.keys.clear();
        keep_playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert!(is_quit_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_quit_key(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::NONE
        )));
    }
}
