use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use puck::{InputState, KeySet};

/// How long a key counts as held after its last press or repeat when the
/// terminal does not report releases.
pub const HOLD_DECAY: Duration = Duration::from_millis(150);

pub fn key_flag(code: KeyCode) -> Option<KeySet> {
    let flag = match code {
        KeyCode::Up => KeySet::UP,
        KeyCode::Down => KeySet::DOWN,
        KeyCode::Left => KeySet::LEFT,
        KeyCode::Right => KeySet::RIGHT,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => KeySet::W,
            's' => KeySet::S,
            'a' => KeySet::A,
            'd' => KeySet::D,
            _ => return None,
        },
        _ => return None,
    };
    Some(flag)
}

/// Turns terminal key events into held paddle keys plus one-shot
/// quit and pause requests.
#[derive(Debug, Default)]
pub struct KeyTracker {
    held: HashMap<KeySet, Instant>,
    reports_release: bool,
    quit: bool,
    pause: bool,
}

impl KeyTracker {
    pub fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            ..Self::default()
        }
    }

    pub fn handle(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => match key.code {
                KeyCode::Esc => self.quit = true,
                KeyCode::Char('p') | KeyCode::Char('P') => {
                    if key.kind == KeyEventKind::Press {
                        self.pause = true;
                    }
                }
                code => {
                    if let Some(flag) = key_flag(code) {
                        self.held.insert(flag, now);
                    }
                }
            },
            KeyEventKind::Release => {
                self.reports_release = true;
                if let Some(flag) = key_flag(key.code) {
                    self.held.remove(&flag);
                }
            }
        }
    }

    pub fn keys(&mut self, now: Instant) -> KeySet {
        if !self.reports_release {
            self.held
                .retain(|_, pressed| now.saturating_duration_since(*pressed) < HOLD_DECAY);
        }
        self.held.keys().fold(KeySet::empty(), |keys, flag| keys | *flag)
    }

    /// Current state; quit and pause are reported once.
    pub fn take_state(&mut self, now: Instant) -> InputState {
        InputState {
            keys: self.keys(now),
            quit: std::mem::take(&mut self.quit),
            pause: std::mem::take(&mut self.pause),
        }
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.quit = false;
        self.pause = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn test_key_flags() {
        assert_eq!(key_flag(KeyCode::Up), Some(KeySet::UP));
        assert_eq!(key_flag(KeyCode::Char('W')), Some(KeySet::W));
        assert_eq!(key_flag(KeyCode::Char('x')), None);
        assert_eq!(key_flag(KeyCode::Enter), None);
    }

    #[test]
    fn test_keys_decay_without_release_events() {
        let start = Instant::now();
        let mut tracker = KeyTracker::new(false);
        tracker.handle(press(KeyCode::Up), start);
        tracker.handle(press(KeyCode::Char('s')), start);

        assert_eq!(tracker.keys(start), KeySet::UP | KeySet::S);
        assert_eq!(tracker.keys(start + HOLD_DECAY), KeySet::empty());
    }

    #[test]
    fn test_repeat_keeps_key_held() {
        let start = Instant::now();
        let mut tracker = KeyTracker::new(false);
        tracker.handle(press(KeyCode::Left), start);

        let later = start + HOLD_DECAY / 2;
        tracker.handle(
            KeyEvent::new_with_kind(KeyCode::Left, KeyModifiers::NONE, KeyEventKind::Repeat),
            later,
        );
        assert_eq!(tracker.keys(start + HOLD_DECAY), KeySet::LEFT);
    }

    #[test]
    fn test_release_events_end_hold() {
        let start = Instant::now();
        let mut tracker = KeyTracker::new(true);
        tracker.handle(press(KeyCode::Down), start);
        assert_eq!(tracker.keys(start + HOLD_DECAY * 10), KeySet::DOWN);

        tracker.handle(release(KeyCode::Down), start + HOLD_DECAY * 10);
        assert_eq!(tracker.keys(start + HOLD_DECAY * 10), KeySet::empty());
    }

    #[test]
    fn test_quit_and_pause_are_one_shot() {
        let now = Instant::now();
        let mut tracker = KeyTracker::new(false);
        tracker.handle(press(KeyCode::Char('p')), now);
        tracker.handle(press(KeyCode::Esc), now);

        let state = tracker.take_state(now);
        assert!(state.quit && state.pause);
        let state = tracker.take_state(now);
        assert!(!state.quit && !state.pause);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let now = Instant::now();
        let mut tracker = KeyTracker::new(false);
        tracker.handle(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            now,
        );
        assert!(tracker.take_state(now).quit);
    }
}
