use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use puck::config::USERNAME_MAX_LEN;
use puck::{
    Difficulty, GameConfig, GameSession, Lobby, Match, Mode, PeerRecord, Role, SessionOutcome,
};

use crate::settings::Settings;
use crate::tui::{
    Labels, MAIN_MENU, MenuView, Screen, Tui, lobby_entries, single_player_entries,
};

/// Head start the inviter's handshake keeps over our prompt, so a late
/// answer still reaches a peer that is waiting for it.
const PROMPT_MARGIN: Duration = Duration::from_secs(1);

/// How long the invitation prompt stays up for a given handshake timeout.
fn prompt_window(invitation_timeout: Duration) -> Duration {
    invitation_timeout.saturating_sub(PROMPT_MARGIN)
}

/// What to do right after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    Menu,
    SinglePlayer(Difficulty),
    TwoPlayers,
    Lan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    ChangeScreen(Screen),
    PlaySingle(Difficulty),
    PlayTwo,
    OpenLobby,
    CloseLobby,
    Invite(usize),
    AcceptInvitation,
    RefuseInvitation,
    SaveUsername,
}

pub struct App {
    config: GameConfig,
    settings: Settings,
    screen: Screen,
    selected_index: usize,
    username_input: String,
    lobby: Option<Lobby>,
    peers: Vec<PeerRecord>,
    invitation: Option<(String, Instant)>,
    waiting_for: Option<String>,
    message: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(config: GameConfig, settings: Settings) -> Self {
        Self {
            config,
            settings,
            screen: Screen::MainMenu,
            selected_index: 0,
            username_input: String::new(),
            lobby: None,
            peers: Vec::new(),
            invitation: None,
            waiting_for: None,
            message: None,
            should_quit: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run(&mut self, tui: &mut Tui, launch: Launch) -> io::Result<()> {
        match launch {
            Launch::Menu => {}
            Launch::SinglePlayer(difficulty) => {
                self.process_action(tui, Action::PlaySingle(difficulty))?;
                self.should_quit = true;
            }
            Launch::TwoPlayers => {
                self.process_action(tui, Action::PlayTwo)?;
                self.should_quit = true;
            }
            Launch::Lan => self.process_action(tui, Action::OpenLobby)?,
        }

        while !self.should_quit {
            self.refresh_lobby();
            self.draw(tui)?;

            if let Some(key) = tui.menu_key()? {
                self.message = None;
                let action = self.handle_key(key.code, key.modifiers);
                self.process_action(tui, action)?;
            }
        }

        self.close_lobby();
        Ok(())
    }

    fn draw(&mut self, tui: &mut Tui) -> io::Result<()> {
        let invitation_left = self
            .invitation
            .as_ref()
            .map(|(_, since)| {
                prompt_window(self.config.net.invitation_timeout).saturating_sub(since.elapsed())
            })
            .unwrap_or_default();

        let view = MenuView {
            screen: self.screen,
            selected: self.selected_index,
            username: &self.settings.username,
            input: &self.username_input,
            peers: &self.peers,
            invitation_from: self.invitation.as_ref().map(|(name, _)| name.as_str()),
            invitation_left,
            waiting_for: self.waiting_for.as_deref(),
            message: self.message.as_deref(),
        };
        tui.draw_menu(&view)
    }

    /// Picks up the latest peer list and any incoming invitation.
    fn refresh_lobby(&mut self) {
        let Some(lobby) = self.lobby.as_mut() else {
            return;
        };
        self.peers = lobby.peers();

        match self.screen {
            Screen::Lobby => {
                let last = lobby_entries(&self.peers).len() - 1;
                self.selected_index = self.selected_index.min(last);

                if let Some(invitation) = lobby.poll_invitation() {
                    self.invitation = Some((invitation.username.clone(), Instant::now()));
                    self.screen = Screen::Invitation;
                }
            }
            Screen::Invitation => {
                let window = prompt_window(self.config.net.invitation_timeout);
                let expired = self
                    .invitation
                    .as_ref()
                    .is_none_or(|(_, since)| since.elapsed() >= window);
                if expired {
                    log::info!("invitation prompt timed out");
                    lobby.refuse_invitation();
                    self.invitation = None;
                    self.screen = Screen::Lobby;
                }
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.screen {
            Screen::MainMenu => self.handle_main_menu_key(code),
            Screen::SinglePlayer => self.handle_single_player_key(code),
            Screen::Lobby => self.handle_lobby_key(code),
            Screen::EditUsername => self.handle_edit_username_key(code),
            Screen::Invitation => self.handle_invitation_key(code),
            Screen::Waiting => Action::None,
        }
    }

    fn navigate(&mut self, code: KeyCode, entries: usize) -> bool {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_index = (self.selected_index + 1).min(entries.saturating_sub(1));
                true
            }
            _ => false,
        }
    }

    fn handle_main_menu_key(&mut self, code: KeyCode) -> Action {
        if self.navigate(code, MAIN_MENU.len()) {
            return Action::None;
        }
        match code {
            KeyCode::Enter => match self.selected_index {
                0 => Action::ChangeScreen(Screen::SinglePlayer),
                1 => Action::PlayTwo,
                2 => Action::OpenLobby,
                3 => Action::Quit,
                _ => Action::None,
            },
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            _ => Action::None,
        }
    }

    fn handle_single_player_key(&mut self, code: KeyCode) -> Action {
        if self.navigate(code, single_player_entries().len()) {
            return Action::None;
        }
        match code {
            KeyCode::Enter => match Difficulty::ALL.get(self.selected_index) {
                Some(difficulty) => Action::PlaySingle(*difficulty),
                None => Action::ChangeScreen(Screen::MainMenu),
            },
            KeyCode::Esc | KeyCode::Backspace => Action::ChangeScreen(Screen::MainMenu),
            _ => Action::None,
        }
    }

    fn handle_lobby_key(&mut self, code: KeyCode) -> Action {
        let entries = lobby_entries(&self.peers).len();
        if self.navigate(code, entries) {
            return Action::None;
        }
        match code {
            KeyCode::Enter => {
                let index = self.selected_index;
                if index < self.peers.len() {
                    Action::Invite(index)
                } else if index == entries - 2 {
                    Action::ChangeScreen(Screen::EditUsername)
                } else if index == entries - 1 {
                    Action::CloseLobby
                } else {
                    Action::None
                }
            }
            KeyCode::Esc | KeyCode::Backspace => Action::CloseLobby,
            _ => Action::None,
        }
    }

    fn handle_edit_username_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc => Action::ChangeScreen(Screen::Lobby),
            KeyCode::Enter if !self.username_input.is_empty() => Action::SaveUsername,
            KeyCode::Backspace => {
                self.username_input.pop();
                Action::None
            }
            KeyCode::Char(c)
                if c.is_ascii_alphanumeric()
                    && self.username_input.chars().count() < USERNAME_MAX_LEN =>
            {
                self.username_input.push(c);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_invitation_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => Action::AcceptInvitation,
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Action::RefuseInvitation,
            _ => Action::None,
        }
    }

    fn process_action(&mut self, tui: &mut Tui, action: Action) -> io::Result<()> {
        match action {
            Action::None => {}
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ChangeScreen(screen) => {
                if screen == Screen::EditUsername {
                    self.username_input = self.settings.username.clone();
                }
                self.screen = screen;
                self.selected_index = 0;
            }
            Action::PlaySingle(difficulty) => {
                let labels = Labels {
                    left: self.settings.username.clone(),
                    right: format!("cpu ({difficulty})"),
                };
                self.play(tui, Mode::SinglePlayer(difficulty), labels)?;
            }
            Action::PlayTwo => {
                let labels = Labels {
                    left: "Player 1".to_string(),
                    right: "Player 2".to_string(),
                };
                self.play(tui, Mode::TwoPlayers, labels)?;
            }
            Action::OpenLobby => match Lobby::open(&self.config.net, &self.settings.username) {
                Ok(lobby) => {
                    self.lobby = Some(lobby);
                    self.peers.clear();
                    self.screen = Screen::Lobby;
                    self.selected_index = 0;
                }
                Err(e) => {
                    log::warn!("could not open the LAN lobby: {e}");
                    self.message = Some(format!("Could not open the LAN lobby: {e}"));
                }
            },
            Action::CloseLobby => {
                self.close_lobby();
                self.screen = Screen::MainMenu;
                self.selected_index = 0;
            }
            Action::Invite(index) => self.invite(tui, index)?,
            Action::AcceptInvitation => {
                let Some(lobby) = self.lobby.as_mut() else {
                    return Ok(());
                };
                self.invitation = None;
                match lobby.accept_invitation() {
                    Ok(found) => self.play_match(tui, found)?,
                    Err(e) => {
                        log::warn!("could not accept invitation: {e}");
                        self.message = Some(format!("Could not accept invitation: {e}"));
                        self.screen = Screen::Lobby;
                    }
                }
            }
            Action::RefuseInvitation => {
                if let Some(lobby) = self.lobby.as_mut() {
                    lobby.refuse_invitation();
                }
                self.invitation = None;
                self.screen = Screen::Lobby;
            }
            Action::SaveUsername => {
                self.settings.set_username(&self.username_input);
                if let Some(lobby) = &self.lobby {
                    lobby.set_username(&self.settings.username);
                }
                self.screen = Screen::Lobby;
                self.selected_index = 0;
            }
        }

        Ok(())
    }

    /// Blocks on the handshake; the waiting screen stays up meanwhile.
    fn invite(&mut self, tui: &mut Tui, index: usize) -> io::Result<()> {
        let Some(peer) = self.peers.get(index).cloned() else {
            return Ok(());
        };
        self.waiting_for = Some(peer.username.clone());
        self.screen = Screen::Waiting;
        self.draw(tui)?;

        let result = match self.lobby.as_mut() {
            Some(lobby) => lobby.invite(&peer),
            None => return Ok(()),
        };
        self.waiting_for = None;
        self.screen = Screen::Lobby;

        match result {
            Ok(found) => self.play_match(tui, found),
            Err(e) => {
                log::warn!("invitation to {} failed: {e}", peer.username);
                self.message = Some(format!("{} did not accept: {e}", peer.username));
                Ok(())
            }
        }
    }

    fn play_match(&mut self, tui: &mut Tui, found: Match) -> io::Result<()> {
        self.close_lobby();

        let own = self.settings.username.clone();
        let labels = match found.role {
            Role::Server => Labels {
                left: own,
                right: found.peer.clone(),
            },
            Role::Client => Labels {
                left: found.peer.clone(),
                right: own,
            },
        };
        let mode = Mode::Network {
            role: found.role,
            connection: found.connection,
            peer: found.peer,
        };
        self.play(tui, mode, labels)
    }

    fn play(&mut self, tui: &mut Tui, mode: Mode, labels: Labels) -> io::Result<()> {
        tui.start_game(labels)?;
        let outcome = GameSession::new(&self.config, mode).run(tui);
        tui.end_game()?;

        match outcome {
            Ok(SessionOutcome::Finished(score)) => {
                log::info!("match over {}-{}", score.left, score.right);
            }
            Ok(SessionOutcome::Quit) => {}
            Err(e) => {
                log::warn!("match aborted: {e}");
                self.message = Some(format!("Match aborted: {e}"));
            }
        }

        self.screen = Screen::MainMenu;
        self.selected_index = 0;
        Ok(())
    }

    fn close_lobby(&mut self) {
        if let Some(mut lobby) = self.lobby.take() {
            lobby.close();
        }
        self.peers.clear();
        self.invitation = None;
    }
}
