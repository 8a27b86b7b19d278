use puck::physics::Rect as BoardRect;
use puck::{FrameState, Score, ScoreScreen, Sound};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::screens::centered_rect;

/// Names shown next to the left and right score.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    pub left: String,
    pub right: String,
}

/// Title and caption of a score screen, as seen by the local player.
pub fn score_text(screen: ScoreScreen, score: &Score) -> (&'static str, &'static str) {
    let finished = score.winner().is_some();
    match screen {
        ScoreScreen::Pause => ("Score", "Press [P] to continue"),
        ScoreScreen::Scored => (
            if finished { "You win!" } else { "Score" },
            "Nice one!",
        ),
        ScoreScreen::Lose => (
            if finished { "You lose!" } else { "Score" },
            "Bad luck... Don't give up!",
        ),
        ScoreScreen::Player1Scored => (
            if finished { "Player 1 wins!" } else { "Score" },
            "Player 1 scored!",
        ),
        ScoreScreen::Player2Scored => (
            if finished { "Player 2 wins!" } else { "Score" },
            "Player 2 scored!",
        ),
    }
}

fn paddle_shape(rect: &BoardRect, board_height: f32, color: Color) -> Rectangle {
    Rectangle {
        x: rect.x as f64,
        y: (board_height - rect.y - rect.height) as f64,
        width: rect.width as f64,
        height: rect.height as f64,
        color,
    }
}

pub fn render_board(frame: &mut Frame, state: &FrameState, labels: &Labels, flash: Option<Sound>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(frame.area());

    let mut hud = vec![
        Span::styled(labels.left.clone(), Style::default().fg(Color::Red)),
        Span::styled(
            format!("  {} - {}  ", state.score.left, state.score.right),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(labels.right.clone(), Style::default().fg(Color::Blue)),
    ];
    match flash {
        Some(Sound::Wall) => hud.push(Span::styled("  *tock*", Style::default().fg(Color::DarkGray))),
        Some(Sound::Blip) => hud.push(Span::styled("  *blip*", Style::default().fg(Color::Yellow))),
        None => {}
    }
    frame.render_widget(
        Paragraph::new(Line::from(hud)).alignment(Alignment::Center),
        chunks[0],
    );

    let width = state.board.x;
    let height = state.board.y;
    let left = paddle_shape(&state.left, height, Color::Red);
    let right = paddle_shape(&state.right, height, Color::Blue);
    let ball = Circle {
        x: state.ball.x as f64,
        y: (height - state.ball.y) as f64,
        radius: state.ball_radius as f64,
        color: Color::White,
    };
    let midline = CanvasLine {
        x1: (width / 2.0) as f64,
        y1: 0.0,
        x2: (width / 2.0) as f64,
        y2: height as f64,
        color: Color::DarkGray,
    };

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, width as f64])
        .y_bounds([0.0, height as f64])
        .paint(move |ctx| {
            ctx.draw(&midline);
            ctx.draw(&left);
            ctx.draw(&right);
            ctx.draw(&ball);
        });
    frame.render_widget(canvas, chunks[1]);
}

pub fn render_score_screen(frame: &mut Frame, screen: ScoreScreen, score: &Score) {
    let (title, caption) = score_text(screen, score);

    let dialog_area = centered_rect(40, 9, frame.area());
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Score ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(dialog_area);

    let title = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    frame.render_widget(title, inner[0]);

    let points = Paragraph::new(format!("{} - {}", score.left, score.right))
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    frame.render_widget(points, inner[1]);

    let caption = Paragraph::new(caption)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    frame.render_widget(caption, inner[2]);
}
