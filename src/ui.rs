use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use appstore_core::{AppRecord, Sender};
use crate::app::{App, DetailState, InputMode, Screen};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Catalog => render_catalog_screen(app, frame, body_area),
        Screen::Detail => render_detail_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.chat_open {
        render_chat_panel(app, frame, body_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let busy_indicator = if app.session.is_awaiting_reply() {
        " [assistant typing]"
    } else {
        ""
    };

    let title = Line::from(vec![
        Span::styled(" Android App Store ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(busy_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = if app.chat_open {
        " ASSISTANT "
    } else {
        match app.screen {
            Screen::Catalog => " APPS ",
            Screen::Detail => " DETAIL ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match (app.chat_open, app.screen, app.input_mode) {
        (true, _, InputMode::Editing) => &[(" Enter ", " send "), (" Esc ", " stop typing ")],
        (true, _, InputMode::Normal) => &[
            (" i ", " type "),
            (" j/k ", " scroll "),
            (" R ", " new chat "),
            (" a ", " close "),
        ],
        (false, Screen::Catalog, InputMode::Editing) => {
            &[(" Enter ", " search "), (" Esc ", " stop typing ")]
        }
        (false, Screen::Catalog, InputMode::Normal) => &[
            (" j/k ", " nav "),
            (" Enter ", " details "),
            (" / ", " search "),
            (" r ", " reload "),
            (" a ", " assistant "),
            (" q ", " quit "),
        ],
        (false, Screen::Detail, _) => &[
            (" j/k ", " scroll "),
            (" Esc ", " back "),
            (" a ", " assistant "),
            (" q ", " quit "),
        ],
    };

    let hints = keys.iter().flat_map(|(key, label)| {
        [
            Span::styled(*key, key_style),
            Span::styled(*label, label_style),
        ]
    });

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_catalog_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    // Layout: search input, categories line, results split into list and preview
    let [input_area, categories_area, results_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing && !app.chat_open;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(" Search apps, categories, or descriptions ");

    let input = Paragraph::new(app.search_input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    if editing {
        frame.set_cursor_position((
            input_area.x + app.search_input.chars().count() as u16 + 1,
            input_area.y + 1,
        ));
    }

    let categories = if app.categories.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = app.categories.iter().map(|c| c.name.as_str()).collect();
        format!(" Categories: {}", names.join(" · "))
    };
    frame.render_widget(
        Paragraph::new(categories).style(Style::default().fg(Color::DarkGray)),
        categories_area,
    );

    if app.catalog_loading && app.total_apps() == 0 {
        let loading = Paragraph::new("Loading apps...")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(loading, results_area);
        return;
    }

    let [list_area, preview_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(results_area);

    let mut title = format!(" Showing {} of {} apps ", app.results().len(), app.total_apps());
    if app.showing_fallback() {
        title.push_str("(offline results) ");
    }

    let results_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if app.results().is_empty() {
        let empty = Paragraph::new(Text::from(vec![
            Line::from(Span::styled("No apps found", Style::default().bold())),
            Line::from(Span::styled(
                "Try adjusting your search terms",
                Style::default().fg(Color::DarkGray),
            )),
        ]))
        .block(results_block);
        frame.render_widget(empty, list_area);
    } else {
        let items: Vec<ListItem> = app
            .results()
            .iter()
            .map(|a| ListItem::new(format!(" {}  ({}) ", a.name, a.category)))
            .collect();

        let list = List::new(items)
            .block(results_block)
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, list_area, &mut app.results_state);
    }

    let preview_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Preview ");

    let preview_text = match app.selected_app() {
        Some(selected) => Text::from(summary_lines(selected)),
        None if app.search_input.trim().is_empty() => featured_text(app),
        None => Text::from("Select an app to preview"),
    };

    let preview = Paragraph::new(preview_text)
        .block(preview_block)
        .wrap(Wrap { trim: true });

    frame.render_widget(preview, preview_area);
}

fn featured_text(app: &App) -> Text<'static> {
    let featured = app.featured_apps();
    if featured.is_empty() {
        return Text::from("Select an app to preview");
    }

    let mut lines = vec![
        Line::from(Span::styled("Featured Apps", Style::default().fg(Color::Yellow).bold())),
        Line::default(),
    ];
    for app in featured {
        lines.push(Line::from(format!("★ {:.1}  {}", app.rating, app.name)));
    }
    Text::from(lines)
}

fn price_span(app: &AppRecord) -> Span<'static> {
    let style = if app.is_free() {
        Style::default().fg(Color::Green).bold()
    } else {
        Style::default().fg(Color::White)
    };
    Span::styled(app.price.to_string(), style)
}

fn summary_lines(app: &AppRecord) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(app.name.clone(), Style::default().fg(Color::Yellow).bold())),
        Line::from(Span::styled(app.category.clone(), Style::default().fg(Color::Cyan))),
        Line::default(),
        Line::from(vec![
            Span::raw(format!("★ {:.1}   {} downloads   ", app.rating, app.downloads)),
            price_span(app),
        ]),
        Line::default(),
        Line::from(app.description.clone()),
    ]
}

fn render_detail_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let (title, text) = match &app.detail {
        None => (" App ".to_string(), Text::from("")),
        Some(DetailState::NotFound(id)) => (
            " App not found ".to_string(),
            Text::from(vec![
                Line::from(Span::styled("App not found", Style::default().bold())),
                Line::from(format!("The app you're looking for ({}) doesn't exist.", id)),
                Line::default(),
                Line::from(Span::styled(
                    "Press Esc to browse all apps",
                    Style::default().fg(Color::DarkGray),
                )),
            ]),
        ),
        Some(DetailState::Loading(record)) | Some(DetailState::Loaded(record)) => {
            let loading = matches!(app.detail, Some(DetailState::Loading(_)));
            let title = if loading {
                format!(" {} (loading...) ", record.name)
            } else {
                format!(" {} ", record.name)
            };
            (title, Text::from(detail_lines(app, record)))
        }
    };

    let detail = Paragraph::new(text)
        .block(block.title(title))
        .wrap(Wrap { trim: true })
        .scroll((app.detail_scroll, 0));

    frame.render_widget(detail, area);
}

fn detail_lines(app: &App, record: &AppRecord) -> Vec<Line<'static>> {
    let heading = Style::default().fg(Color::Yellow).bold();
    let mut lines = summary_lines(record);

    lines.push(Line::default());
    let mut facts = format!("Size: {}", record.size);
    if let Some(version) = &record.version {
        facts.push_str(&format!("   Version: v{}", version));
    }
    lines.push(Line::from(facts));

    let screenshots = record.screenshots();
    if !screenshots.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Screenshots", heading)));
        for (i, url) in screenshots.iter().enumerate() {
            lines.push(Line::from(format!("  {}. {}", i + 1, url)));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Developer", heading)));
    lines.push(Line::from(format!("  {}", record.developer)));

    lines.push(Line::default());
    match app.download_url() {
        Some(url) => lines.push(Line::from(vec![
            Span::styled("Download APK: ", Style::default().fg(Color::Green).bold()),
            Span::raw(url),
        ])),
        None => lines.push(Line::from(Span::styled(
            "APK not available",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    lines
}

/// Assistant panel floats over the right side of the body
fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let [_, panel_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(area);

    frame.render_widget(Clear, panel_area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(panel_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" AI App Store Assistant ");

    let mut lines: Vec<Line> = Vec::new();

    for turn in app.session.transcript() {
        let label_style = match turn.sender {
            Sender::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Sender::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        };
        lines.push(Line::from(Span::styled(App::sender_label(turn.sender), label_style)));
        for line in turn.text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.session.is_awaiting_reply() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("AI is typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    let editing = app.input_mode == InputMode::Editing;
    let waiting = app.session.is_awaiting_reply();
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing && !waiting {
            Color::Yellow
        } else {
            Color::DarkGray
        }))
        .title(if waiting {
            " Waiting for reply... "
        } else {
            " Ask me about apps or recommendations "
        });

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;

    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}
