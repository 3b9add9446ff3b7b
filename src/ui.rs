//! Rendering of the form.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus, Phase, StatusKind};

pub fn render(app: &App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(1), // help line
            Constraint::Min(5),    // text buffer
            Constraint::Length(3), // speed
            Constraint::Length(3), // start delay
            Constraint::Length(1), // status line
        ])
        .split(frame.area());

    render_help(app, frame, chunks[0]);
    render_text(app, frame, chunks[1]);
    render_speed(app, frame, chunks[2]);
    render_delay(app, frame, chunks[3]);
    render_status(app, frame, chunks[4]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    }
}

fn render_help(app: &App, frame: &mut Frame, area: Rect) {
    let help = Line::from(vec![
        Span::styled("ghost-typer", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                "  {} start | {} stop | Tab focus | Esc quit",
                app.start_hotkey.to_uppercase(),
                app.stop_hotkey.to_uppercase()
            ),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(help), area);
}

fn render_text(app: &App, frame: &mut Frame, area: Rect) {
    let title = match app.phase {
        Phase::Typing { emitted, total } => format!(" Text ({}/{}) ", emitted, total),
        _ => format!(" Text ({} chars) ", app.text.chars().count()),
    };

    let focused = app.focus == Focus::Text;
    let mut text = Text::from(app.text.as_str());
    if focused {
        let cursor = Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED));
        match text.lines.last_mut() {
            Some(last) => last.spans.push(cursor),
            None => text.lines.push(Line::from(cursor)),
        }
    }

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(focused))
                .title(title),
        );
    frame.render_widget(paragraph, area);
}

fn render_speed(app: &App, frame: &mut Frame, area: Rect) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app.focus == Focus::Speed))
                .title(" Speed "),
        )
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(f64::from(app.speed) / 100.0)
        .label(format!(
            "{} ({} ms/char)",
            app.speed,
            app.char_delay().as_millis()
        ));
    frame.render_widget(gauge, area);
}

fn render_delay(app: &App, frame: &mut Frame, area: Rect) {
    let value = Line::from(vec![
        Span::styled("< ", Style::default().add_modifier(Modifier::DIM)),
        Span::styled(
            format!("{} s", app.start_delay_secs),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(" >", Style::default().add_modifier(Modifier::DIM)),
    ]);

    let paragraph = Paragraph::new(value).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(app.focus == Focus::Delay))
            .title(" Start delay "),
    );
    frame.render_widget(paragraph, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let style = match app.status.kind {
        StatusKind::Info => Style::default().add_modifier(Modifier::DIM),
        StatusKind::Warning => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        StatusKind::Active => Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        StatusKind::Done => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        StatusKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    };

    let status = Paragraph::new(Span::styled(app.status.message.as_str(), style));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::emitter::recording_factory;
    use crate::session::SessionController;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::{Arc, Mutex};

    #[test]
    fn renders_all_form_sections() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let controller = SessionController::new(
            runtime.handle().clone(),
            recording_factory(Arc::new(Mutex::new(Vec::new()))),
            |_| {},
        );
        let app = App::new(&Config::default(), controller, Some("hello".to_string()));

        let backend = TestBackend::new(60, 18);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(&app, f)).unwrap();

        let rendered = format!("{:?}", terminal.backend().buffer());
        assert!(rendered.contains("Speed"));
        assert!(rendered.contains("Start delay"));
        assert!(rendered.contains("ghost-typer"));
    }
}
