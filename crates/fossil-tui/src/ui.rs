use fossil_client::KeyValueStore;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, InputMode, Modal};
use crate::explorer::RecordExplorer;

fn highlight() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// First row to show so that `selected` stays inside a window of `height` rows.
fn scroll_start(selected: usize, height: usize) -> usize {
    selected.saturating_sub(height.saturating_sub(1))
}

pub fn render<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_inputs(f, app, root[0]);
    match &app.explorer {
        Some(explorer) => render_explorer(f, explorer, root[1]),
        None => render_browser(f, app, root[1]),
    }

    let status = format!("{}  {}", app.status, app.metrics_line());
    f.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
        root[2],
    );

    if let Some(modal) = &app.modal {
        render_modal(f, modal, app);
    }
}

fn render_inputs<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let field = |mode: InputMode, label: &str, value: &str| {
        if app.input_mode == mode {
            format!("[{label}: {}_]", app.input)
        } else {
            format!(" {label}: {value} ")
        }
    };
    let text = format!(
        "{} {} {}",
        field(InputMode::Collection, "collection", &app.collection),
        field(InputMode::AfterKey, "start after", &app.after_key),
        field(InputMode::Prefix, "prefix", &app.prefix),
    );
    let style = if app.input_mode != InputMode::Normal {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    f.render_widget(
        Paragraph::new(text)
            .style(style)
            .block(Block::default().title("FossilDB").borders(Borders::ALL)),
        area,
    );
}

fn render_browser<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let height = cols[0].height.saturating_sub(2) as usize;
    let start = scroll_start(app.selected_row, height);
    let lines: Vec<Line> = app
        .keys
        .iter()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(i, key)| {
            let line = Line::from(format!("{i:>4} {key}"));
            if i == app.selected_row {
                line.style(highlight())
            } else {
                line
            }
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(format!("Keys ({})", app.keys.len()))
                .borders(Borders::ALL),
        ),
        cols[0],
    );

    let mut info = Vec::new();
    match &app.key_info {
        Some(ki) => {
            info.push(format!("Key: {}", ki.key));
            match &ki.versions {
                Ok(versions) => info.push(format!(
                    "Versions: {}",
                    versions
                        .iter()
                        .map(u64::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                )),
                Err(err) => info.push(err.clone()),
            }
        }
        None => info.push("No key selected".to_string()),
    }
    info.push(String::new());
    info.push("keys: j/k move  Enter open  w write out.bin  n next page  r refresh".to_string());
    info.push("      c collection  a start after  p prefix  q quit".to_string());
    f.render_widget(
        Paragraph::new(info.join("\n"))
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Key Info").borders(Borders::ALL)),
        cols[1],
    );
}

fn render_explorer(f: &mut Frame, explorer: &RecordExplorer, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let height = cols[0].height.saturating_sub(2) as usize;
    let start = scroll_start(explorer.cursor, height);
    let lines: Vec<Line> = explorer
        .lines()
        .iter()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(i, line)| {
            let text = Line::from(line.text());
            if i == explorer.cursor {
                text.style(highlight())
            } else {
                text
            }
        })
        .collect();
    let title = match explorer.view() {
        Some(view) => format!("Record ({})", view.summary()),
        None => "Record".to_string(),
    };
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        cols[0],
    );

    let mut info = vec![
        format!(
            "Exploring {}:{}",
            explorer.key.collection, explorer.key.key
        ),
        format!(
            "Viewing version {}",
            explorer
                .selected_version()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        format!("{} bytes", explorer.data().map(<[u8]>::len).unwrap_or(0)),
        String::new(),
        "Versions:".to_string(),
    ];
    for (i, version) in explorer.versions.iter().enumerate() {
        let marker = if i == explorer.selected { ">" } else { " " };
        info.push(format!("{marker} {version}"));
    }
    info.push(String::new());
    info.push("h/l version  j/k move  Space fold".to_string());
    info.push("x hex  s save  d delete  Esc back".to_string());
    f.render_widget(
        Paragraph::new(info.join("\n"))
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Info").borders(Borders::ALL)),
        cols[1],
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_modal<S: KeyValueStore>(f: &mut Frame, modal: &Modal, app: &App<S>) {
    let (title, text) = match modal {
        Modal::Notice(message) => ("Saved", format!("{message}\n\n[Enter] Okay")),
        Modal::ConfirmDelete { version } => {
            let key = app
                .explorer
                .as_ref()
                .map(|e| format!("{}:{}", e.key.collection, e.key.key))
                .unwrap_or_default();
            (
                "Delete",
                format!(
                    "Are you sure you want to delete version {version} of {key}?\n\n[y] Yes  [n] No"
                ),
            )
        }
    };
    let area = centered(f.area(), 60, 7);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}
