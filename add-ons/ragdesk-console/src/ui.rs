//! Rendering of [`ConsoleApp`]. Plain layout; styling is kept to focus and status colors.

use chrono::Local;
use ragdesk_core::{FormStatus, SearchForm};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use crate::app::{ConsoleApp, StoreField, View};

const PROMPT_PREVIEW_CHARS: usize = 60;

pub fn draw(f: &mut Frame, app: &ConsoleApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match app.view {
        View::Generate => draw_generate(f, app, chunks[1]),
        View::Store => draw_store(f, app, chunks[1]),
        View::SimilarSearch => draw_search(f, &app.similar, chunks[1]),
        View::TextSearch => draw_search(f, &app.text, chunks[1]),
    }

    let help = match app.view {
        View::Generate => "Enter=generate  Up/Down=history  Ctrl+R=replay  Ctrl+D=delete  Ctrl+L=clear  F5=health  Esc=quit",
        View::Store => "Enter=save  Tab=switch field  F5=health  Esc=quit",
        _ => "Enter=search  F5=health  Esc=quit",
    };
    let footer = match &app.notice {
        Some(notice) => Line::from(vec![
            Span::styled(notice.as_str(), Style::default().fg(Color::Red)),
            Span::raw("  "),
            Span::raw(help),
        ]),
        None => Line::from(help),
    };
    f.render_widget(Paragraph::new(footer), chunks[2]);
}

fn draw_header(f: &mut Frame, app: &ConsoleApp, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(44)])
        .split(area);

    let titles: Vec<Line> = View::ALL.iter().map(|v| Line::from(v.title())).collect();
    let tabs = Tabs::new(titles)
        .select(app.view.index())
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" ragdesk "));
    f.render_widget(tabs, cols[0]);

    let (label, color) = match &app.health {
        None => ("checking...".to_string(), Color::Gray),
        Some(report) if report.is_connected() => {
            (format!("connected {}", report.backend), Color::Green)
        }
        Some(report) => (format!("{} {}", report.status, report.backend), Color::Red),
    };
    let health = Paragraph::new(Span::styled(label, Style::default().fg(color)))
        .block(Block::default().borders(Borders::ALL).title(" Backend "));
    f.render_widget(health, cols[1]);
}

fn prompt_preview(prompt: &str) -> String {
    if prompt.chars().count() > PROMPT_PREVIEW_CHARS {
        let head: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        prompt.to_string()
    }
}

fn draw_generate(f: &mut Frame, app: &ConsoleApp, area: Rect) {
    let form = &app.generation;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let items: Vec<ListItem> = form
        .history()
        .iter()
        .map(|item| {
            let marker = if form.selected() == Some(item.id.as_str()) { "* " } else { "  " };
            let when = item.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
            ListItem::new(vec![
                Line::from(format!("{}{}", marker, prompt_preview(&item.prompt))),
                Line::from(Span::styled(
                    format!("  {}", when),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();
    let title = format!(" History ({}) ", form.history().len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let mut state = ListState::default();
    if !form.history().is_empty() {
        state.select(Some(app.history_cursor));
    }
    f.render_stateful_widget(list, cols[0], &mut state);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(5),
        ])
        .split(cols[1]);

    let response = if form.is_loading() {
        "Generating...\nPlease wait while AI processes your request".to_string()
    } else {
        form.generated_text().unwrap_or_default().to_string()
    };
    f.render_widget(
        Paragraph::new(response)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Response ")),
        rows[0],
    );

    f.render_widget(status_line(form.status(), form.error()), rows[1]);

    let input_title = if form.is_loading() {
        " Prompt (waiting) "
    } else {
        " Prompt (Enter to generate) "
    };
    f.render_widget(
        input_box(form.prompt(), input_title, !form.is_loading()),
        rows[2],
    );
}

fn draw_store(f: &mut Frame, app: &ConsoleApp, area: Rect) {
    let form = &app.data_entry;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(area);

    f.render_widget(
        input_box(
            form.content(),
            " Content ",
            app.store_field == StoreField::Content,
        ),
        rows[0],
    );
    f.render_widget(
        input_box(
            form.context(),
            " Context (optional) ",
            app.store_field == StoreField::Context,
        ),
        rows[1],
    );

    let line = match (form.status(), form.result_id()) {
        (FormStatus::Loading, _) => Paragraph::new("Saving..."),
        (FormStatus::Success, Some(id)) => Paragraph::new(Span::styled(
            format!("Data stored successfully with ID: {}", id),
            Style::default().fg(Color::Green),
        )),
        (status, _) => status_line(status, form.error()),
    };
    f.render_widget(line, rows[2]);
}

fn draw_search(f: &mut Frame, form: &SearchForm, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    let text = if form.query().is_empty() {
        Span::styled(form.kind().placeholder(), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(form.query())
    };
    f.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", form.kind().title())),
        ),
        rows[0],
    );

    let status = if form.is_loading() {
        Paragraph::new("Searching...")
    } else {
        status_line(form.status(), form.error())
    };
    f.render_widget(status, rows[1]);

    let items: Vec<ListItem> = form
        .results()
        .iter()
        .map(|r| ListItem::new(r.as_str()))
        .collect();
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Results ")),
        rows[2],
    );
}

fn input_box<'a>(value: &'a str, title: &'a str, focused: bool) -> Paragraph<'a> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Paragraph::new(value)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).border_style(border).title(title))
}

fn status_line(status: FormStatus, error: Option<&str>) -> Paragraph<'_> {
    match (status, error) {
        (_, Some(err)) => Paragraph::new(Span::styled(err, Style::default().fg(Color::Red))),
        (FormStatus::Loading, None) => Paragraph::new("Working..."),
        _ => Paragraph::new(""),
    }
}
