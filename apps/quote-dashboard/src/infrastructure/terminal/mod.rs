//! Terminal Display Adapter
//!
//! Draws render frames with ratatui. The live surface runs on the alternate
//! screen with the cursor hidden. Raw mode stays off so Ctrl+C still reaches
//! the process as SIGINT.

use std::io::{self, Stdout};

use crossterm::{cursor, execute, terminal};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Cell, Paragraph, Row, Table};

use crate::application::ports::DisplaySurface;
use crate::application::services::render::{Direction, GainTone, RenderFrame};

/// Table title.
pub const TITLE: &str = "Live Yahoo Finance Ticker Stream";

const HEADERS: [&str; 4] = ["Symbol", "Price", "Volume", "Gain"];

/// A ratatui terminal used as a [`DisplaySurface`].
pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
}

impl TerminalSurface<CrosstermBackend<Stdout>> {
    /// Switch stdout to the alternate screen and take it over.
    ///
    /// Installs a panic hook that puts the terminal back before the default
    /// hook prints.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be prepared.
    pub fn enter() -> io::Result<Self> {
        let previous_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show);
            previous_hook(info);
        }));

        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
        Self::with_backend(CrosstermBackend::new(stdout))
    }

    /// Leave the alternate screen and show the cursor again.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be restored.
    pub fn restore(mut self) -> io::Result<()> {
        execute!(
            self.terminal.backend_mut(),
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        self.terminal.show_cursor()
    }
}

impl<B: Backend> TerminalSurface<B> {
    /// Wrap an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report its size.
    pub fn with_backend(backend: B) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
        })
    }

    /// Borrow the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl<B: Backend> DisplaySurface for TerminalSurface<B> {
    fn present(&mut self, frame: &RenderFrame) -> io::Result<()> {
        self.terminal.draw(|f| draw_frame(f, frame))?;
        Ok(())
    }
}

// =============================================================================
// Drawing
// =============================================================================

fn price_style(direction: Direction) -> Style {
    match direction {
        Direction::Up => Style::new().fg(Color::Green).add_modifier(Modifier::BOLD),
        Direction::Down => Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
        Direction::Neutral => Style::new().fg(Color::White),
    }
}

fn gain_style(tone: GainTone) -> Style {
    match tone {
        GainTone::Positive => Style::new().fg(Color::LightGreen),
        GainTone::Negative => Style::new().fg(Color::LightRed),
        GainTone::Zero | GainTone::Untracked => Style::new().fg(Color::DarkGray),
    }
}

/// Draw `frame` into a ratatui frame: bordered table, then a footer line.
pub fn draw_frame(f: &mut ratatui::Frame, frame: &RenderFrame) {
    // Borders plus header row.
    let table_height = u16::try_from(frame.rows.len()).unwrap_or(u16::MAX).saturating_add(3);
    let [table_area, footer_area, _] = Layout::vertical([
        Constraint::Length(table_height),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(f.area());

    let header = Row::new(HEADERS).style(Style::new().add_modifier(Modifier::BOLD));
    let rows = frame.rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.symbol.as_str()).style(Style::new().fg(Color::Cyan)),
            Cell::from(row.price.text.as_str()).style(price_style(row.price.direction)),
            Cell::from(row.volume.as_str()),
            Cell::from(row.gain.text.as_str()).style(gain_style(row.gain.tone)),
        ])
    });
    let widths = [
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::bordered().title(TITLE));
    f.render_widget(table, table_area);

    let footer_text = format!("feed: {}  {}", frame.feed.as_str(), frame.clock);
    let footer = Paragraph::new(Line::from(footer_text))
        .style(Style::new().fg(Color::DarkGray))
        .alignment(Alignment::Right);
    f.render_widget(footer, footer_area);
}
