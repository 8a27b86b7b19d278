use std::time::Duration;

use puck::{Difficulty, PeerRecord};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    SinglePlayer,
    Lobby,
    EditUsername,
    Invitation,
    Waiting,
}

pub const MAIN_MENU: [&str; 4] = ["Single Player", "2 Players", "2 Players (LAN)", "Exit"];

/// Everything the menu screens need from the application state.
#[derive(Debug, Clone, Copy)]
pub struct MenuView<'a> {
    pub screen: Screen,
    pub selected: usize,
    pub username: &'a str,
    pub input: &'a str,
    pub peers: &'a [PeerRecord],
    pub invitation_from: Option<&'a str>,
    pub invitation_left: Duration,
    pub waiting_for: Option<&'a str>,
    pub message: Option<&'a str>,
}

/// Entries of the lobby list: one per peer, then the fixed options.
pub fn lobby_entries(peers: &[PeerRecord]) -> Vec<String> {
    let mut entries: Vec<String> = if peers.is_empty() {
        vec!["(no players found)".to_string()]
    } else {
        peers
            .iter()
            .map(|peer| format!("Play with {} ({})", peer.username, peer.addr))
            .collect()
    };
    entries.push("Edit username".to_string());
    entries.push("Return to main menu".to_string());
    entries
}

pub fn single_player_entries() -> Vec<String> {
    Difficulty::ALL
        .iter()
        .map(|difficulty| format!("Play ({difficulty})"))
        .chain(std::iter::once("Return to main menu".to_string()))
        .collect()
}

pub fn render(frame: &mut Frame, view: &MenuView) {
    let area = frame.area();

    let block = Block::default()
        .title(" Air Hockey ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match view.screen {
        Screen::MainMenu => render_main_menu(frame, inner[0], view.selected),
        Screen::SinglePlayer => render_list(
            frame,
            inner[0],
            " Single Player ",
            &single_player_entries(),
            view.selected,
        ),
        Screen::Lobby => render_lobby(frame, inner[0], view),
        Screen::EditUsername => render_edit_username(frame, inner[0], view.input),
        Screen::Invitation => render_invitation(frame, inner[0], view),
        Screen::Waiting => render_waiting(frame, inner[0], view.waiting_for.unwrap_or("player")),
    }

    if let Some(message) = view.message {
        let status = Paragraph::new(message)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        frame.render_widget(status, inner[1]);
    }
}

fn render_main_menu(frame: &mut Frame, area: Rect, selected: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    let title = r#"
    _    _         _  _         _
   /_\  (_)_ _    | || |___  __| |_____ _  _
  / _ \ | | '_|   | __ / _ \/ _| / / -_) || |
 /_/ \_\|_|_|     |_||_\___/\__|_\_\___|\_, |
                                        |__/
"#;

    let title_widget = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    frame.render_widget(title_widget, chunks[0]);

    let entries: Vec<String> = MAIN_MENU.iter().map(|s| s.to_string()).collect();
    render_list(frame, chunks[2], " Menu ", &entries, selected);

    let help = Paragraph::new("↑↓ Navigate  Enter Select  Q Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[3]);
}

fn render_list(frame: &mut Frame, area: Rect, title: &str, entries: &[String], selected: usize) {
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let item = ListItem::new(format!("  {entry}"));
            if i == selected {
                item.style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                item.style(Style::default().fg(Color::White))
            }
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    let width = entries
        .iter()
        .map(|e| e.chars().count() as u16 + 6)
        .max()
        .unwrap_or(0)
        .max(40);
    let list_area = centered_rect(width, entries.len() as u16 + 2, area);
    frame.render_widget(list, list_area);
}

fn render_lobby(frame: &mut Frame, area: Rect, view: &MenuView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Playing as ", Style::default().fg(Color::White)),
        Span::styled(
            view.username.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(header, chunks[0]);

    render_list(
        frame,
        chunks[1],
        " 2 Players (LAN) ",
        &lobby_entries(view.peers),
        view.selected,
    );

    let help = Paragraph::new("↑↓ Navigate  Enter Invite  Esc Back")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

fn render_edit_username(frame: &mut Frame, area: Rect, input: &str) {
    let dialog_area = centered_rect(50, 9, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Edit Username ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(dialog_area);

    let label = Paragraph::new("Username:").style(Style::default().fg(Color::White));
    frame.render_widget(label, inner[0]);

    let input_text = Paragraph::new(format!("{input}_"))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    frame.render_widget(input_text, inner[1]);

    let help = Paragraph::new("Enter Save  Esc Back")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[3]);
}

fn render_invitation(frame: &mut Frame, area: Rect, view: &MenuView) {
    let dialog_area = centered_rect(50, 8, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Invitation ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(dialog_area);

    let lines = vec![
        Line::from(Span::styled(
            format!("{} wants to play!", view.invitation_from.unwrap_or("someone")),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Answer within {}s", view.invitation_left.as_secs() + 1),
            Style::default().fg(Color::White),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner[0]);

    let help = Paragraph::new("Y/Enter Accept  N/Esc Refuse")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[1]);
}

fn render_waiting(frame: &mut Frame, area: Rect, peer: &str) {
    let dialog_area = centered_rect(50, 5, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Invitation Sent ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0)])
        .split(dialog_area);

    let status = Paragraph::new(format!("Waiting for {peer} response..."))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    frame.render_widget(status, inner[0]);
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
