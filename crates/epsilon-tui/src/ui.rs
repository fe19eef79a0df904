use std::time::Instant;

use epsilon_core::markup::{parse_fragment, Block as MarkupBlock, Inline};
use epsilon_core::{thread_view, ChatRole, MessageAction, ToastPhase, ViewNode, SUGGESTIONS};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use crate::app::{input_rows, wrap_input, App, Focus, MAX_INPUT_ROWS};

const SIDEBAR_WIDTH: u16 = 28;

/// Convert parsed HTML blocks into styled terminal lines
fn markup_lines(html: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for (i, block) in parse_fragment(html).into_iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        match block {
            MarkupBlock::Paragraph(inlines) => {
                lines.extend(inline_lines(&inlines, None));
            }
            MarkupBlock::Code(code) => {
                for line in code.trim_end_matches('\n').lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", line),
                        Style::default().fg(Color::Green),
                    )));
                }
            }
            MarkupBlock::List(items) => {
                for item in items {
                    lines.extend(inline_lines(&item, Some("  • ")));
                }
            }
        }
    }

    lines
}

/// Split inline runs at hard breaks, styling bold/italic runs
fn inline_lines(inlines: &[Inline], prefix: Option<&'static str>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = prefix.map(Span::raw).into_iter().collect();

    for inline in inlines {
        if inline.text == "\n" {
            lines.push(Line::from(std::mem::take(&mut spans)));
            continue;
        }
        let mut style = Style::default();
        if inline.style.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if inline.style.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        spans.push(Span::styled(inline.text.clone(), style));
    }
    lines.push(Line::from(spans));
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    app.width = area.width;
    app.sidebar_area = None;

    // Wide layouts give the sidebar its own column
    let docked = app.sidebar_open && !app.is_narrow();
    let main_area = if docked {
        let [sidebar_area, main_area] = Layout::horizontal([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Min(0),
        ])
        .areas(area);
        render_sidebar(app, frame, sidebar_area);
        main_area
    } else {
        area
    };

    let input_height = input_rows(&app.input, main_area.width.saturating_sub(2) as usize) + 2;

    // Main layout: header, chat, input, footer
    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(main_area);

    render_header(app, frame, header_area);
    if app.is_welcome() {
        render_welcome(app, frame, body_area);
    } else {
        render_thread(app, frame, body_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    // Narrow layouts draw the sidebar over a dimmed chat
    if app.sidebar_open && !docked {
        frame.render_widget(
            Block::default().style(Style::default().bg(Color::Black).fg(Color::DarkGray)),
            area,
        );
        let sidebar_area = Rect::new(area.x, area.y, SIDEBAR_WIDTH.min(area.width), area.height);
        frame.render_widget(Clear, sidebar_area);
        render_sidebar(app, frame, sidebar_area);
    }

    render_toast(app, frame, input_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.controller.session().is_typing() {
        format!(" {} is typing{}", app.render_options.assistant_name, ".".repeat(app.animation_frame as usize + 1))
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", app.render_options.assistant_name),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(status, Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.focus {
        Focus::Input => Style::default().bg(Color::Yellow).fg(Color::Black),
        Focus::Thread | Focus::Sidebar => Style::default().bg(Color::Blue).fg(Color::White),
    };

    let mode_text = match app.focus {
        Focus::Input => " INPUT ",
        Focus::Thread if app.is_welcome() => " SUGGEST ",
        Focus::Thread => " THREAD ",
        Focus::Sidebar => " MENU ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let mut hints = match app.focus {
        Focus::Input => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", if app.can_send() { label_style } else { disabled_style }),
            Span::styled(" S-Enter ", key_style),
            Span::styled(" newline ", label_style),
        ],
        Focus::Thread if app.is_welcome() => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" choose ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" ask ", label_style),
        ],
        Focus::Thread => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" reply ", label_style),
            Span::styled(" h/l ", key_style),
            Span::styled(" action ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" run ", label_style),
            Span::styled(" c ", key_style),
            Span::styled(" copy ", label_style),
        ],
        Focus::Sidebar => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" new chat ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" close ", label_style),
        ],
    };

    hints.extend(vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
        Span::styled(" ^N ", key_style),
        Span::styled(" new chat ", label_style),
        Span::styled(" ^B ", key_style),
        Span::styled(" menu ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

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

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    app.sidebar_area = Some(area);

    let focused = app.focus == Focus::Sidebar;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.render_options.assistant_name));

    // Current chat is titled by its first message
    let current = app
        .controller
        .session()
        .messages()
        .first()
        .map(|m| m.content.lines().next().unwrap_or_default().to_string())
        .unwrap_or_else(|| "New conversation".to_string());

    let items = vec![
        ListItem::new(" + New chat ").style(Style::default().fg(Color::Green).bold()),
        ListItem::new(""),
        ListItem::new(" Today").style(Style::default().fg(Color::DarkGray)),
        ListItem::new(format!("  {}", current)),
    ];

    let mut state = ListState::default();
    if focused {
        state.select(Some(0));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_welcome(app: &mut App, frame: &mut Frame, area: Rect) {
    app.thread_area = Some(area);

    let [greeting_area, cards_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Min(0),
    ])
    .areas(area);

    let greeting = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            app.render_options.assistant_name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from("How can I help you today?").centered(),
    ]);
    frame.render_widget(Paragraph::new(greeting), greeting_area);

    let focused = app.focus == Focus::Thread;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Suggestions (Tab to focus, Enter to ask) ");

    let items: Vec<ListItem> = SUGGESTIONS
        .iter()
        .map(|s| {
            ListItem::new(Text::from(vec![
                Line::from(Span::styled(format!(" {}", s.title), Style::default().bold())),
                Line::from(Span::styled(format!(" {}", s.subtitle), Style::default().fg(Color::DarkGray))),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    if focused {
        state.select(Some(app.suggestion_idx));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, cards_area, &mut state);
}

/// Terminal lines for one view node
fn node_lines(app: &App, idx: usize, node: &ViewNode) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match node {
        ViewNode::Message(message) => {
            let selected = app.focus == Focus::Thread && app.selected_reply == Some(idx);
            let author_color = match message.role {
                ChatRole::User => Color::Cyan,
                ChatRole::Assistant => Color::Yellow,
            };
            let marker = if selected { "▌" } else { " " };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::styled(
                    message.author.clone(),
                    Style::default().fg(author_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", message.time), Style::default().fg(Color::DarkGray)),
            ]));

            lines.extend(markup_lines(&message.body_html));

            if !message.actions.is_empty() {
                let mut spans = vec![Span::raw(" ")];
                for (i, action) in message.actions.iter().enumerate() {
                    let mut style = Style::default().fg(Color::DarkGray);
                    if selected && i == app.selected_action {
                        style = Style::default().bg(Color::Blue).fg(Color::White);
                    } else if selected {
                        style = Style::default().fg(Color::Gray);
                    }
                    spans.push(Span::styled(format!("[{}]", action_label(*action)), style));
                    spans.push(Span::raw(" "));
                }
                lines.push(Line::from(spans));
            }
        }
        ViewNode::Typing { author } => {
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    author.clone(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
            ]));
            // One dot lit per animation frame
            let dots: Vec<Span> = (0..3u8)
                .map(|i| {
                    if i == app.animation_frame {
                        Span::styled(" ●", Style::default().fg(Color::Yellow))
                    } else {
                        Span::styled(" ○", Style::default().fg(Color::DarkGray))
                    }
                })
                .collect();
            lines.push(Line::from(dots));
        }
    }

    lines.push(Line::default());
    lines
}

fn action_label(action: MessageAction) -> &'static str {
    match action {
        MessageAction::Copy => "⧉ Copy",
        MessageAction::Regenerate => "↻ Regenerate",
        MessageAction::Like => "+1",
        MessageAction::Dislike => "-1",
    }
}

fn render_thread(app: &mut App, frame: &mut Frame, area: Rect) {
    app.thread_area = Some(area);

    let focused = app.focus == Focus::Thread;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }));

    let inner = block.inner(area);
    let view = thread_view(app.controller.session(), &app.render_options);

    // Lay the nodes out and remember where each one starts
    let mut nodes: Vec<Vec<Line>> = Vec::with_capacity(view.nodes().len());
    let mut message_rows = Vec::with_capacity(view.nodes().len());
    let mut row: u32 = 0;
    for (idx, node) in view.nodes().iter().enumerate() {
        let node_lines = node_lines(app, idx, node);
        let height = Paragraph::new(node_lines.clone())
            .wrap(Wrap { trim: false })
            .line_count(inner.width);
        let height = u32::try_from(height).unwrap_or(u32::MAX);
        message_rows.push((row, height));
        row = row.saturating_add(height);
        nodes.push(node_lines);
    }
    app.message_rows = message_rows;

    app.viewport.resize(row, u32::from(inner.height));
    app.viewport.follow(app.controller.session().revision());
    if app.reveal_selected {
        if let Some(&(top, height)) = app.selected_reply.and_then(|i| app.message_rows.get(i)) {
            app.viewport.reveal(top, height);
        }
        app.reveal_selected = false;
    }

    // Only the nodes overlapping the window go to the paragraph, which
    // keeps its row arithmetic inside u16
    let offset = app.viewport.offset();
    let window_end = offset.saturating_add(u32::from(inner.height));
    let mut lines: Vec<Line> = Vec::new();
    let mut first_top = None;
    for (node_lines, &(top, height)) in nodes.into_iter().zip(&app.message_rows) {
        if top.saturating_add(height) <= offset || top >= window_end {
            continue;
        }
        first_top.get_or_insert(top);
        lines.extend(node_lines);
    }
    let scroll = offset.saturating_sub(first_top.unwrap_or(offset));

    let thread = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    frame.render_widget(thread, area);

    if app.viewport.max_offset() > 0 {
        let mut scrollbar_state = ScrollbarState::new(app.viewport.max_offset() as usize)
            .position(app.viewport.offset() as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            inner,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == Focus::Input;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    // Send affordance mirrors whether a send would be accepted
    let send_style = if app.can_send() {
        Style::default().fg(Color::Green).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ")
        .title_top(Line::from(Span::styled(" Send ▶ ", send_style)).right_aligned());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.input.is_empty() {
        let placeholder = Paragraph::new(format!("Message {}...", app.render_options.assistant_name))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(placeholder, inner);
    } else {
        let (rows, (cursor_row, _)) = wrap_input(&app.input, app.input_cursor, inner.width as usize);
        let visible = inner.height.clamp(1, MAX_INPUT_ROWS) as usize;
        let skip = (cursor_row + 1).saturating_sub(visible);
        let text: Vec<Line> = rows
            .into_iter()
            .skip(skip)
            .take(visible)
            .map(Line::from)
            .collect();
        frame.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Cyan)), inner);
    }

    // Show cursor when editing
    if editing {
        let (_, (cursor_row, cursor_col)) =
            wrap_input(&app.input, app.input_cursor, inner.width as usize);
        let visible = inner.height.clamp(1, MAX_INPUT_ROWS) as usize;
        let row = cursor_row.min(visible - 1) as u16;
        frame.set_cursor_position((inner.x + cursor_col as u16, inner.y + row));
    }
}

fn render_toast(app: &App, frame: &mut Frame, input_area: Rect) {
    let Some((text, phase)) = app.toasts.current(Instant::now()) else {
        return;
    };

    let area = frame.area();
    let width = (text.chars().count() as u16 + 4).min(area.width);
    let height = 3;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = input_area.y.saturating_sub(height);
    let popup_area = Rect::new(x, y, width, height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let style = match phase {
        ToastPhase::Visible => Style::default().fg(Color::White),
        ToastPhase::FadingOut => Style::default().fg(Color::DarkGray),
    };
    let toast = Paragraph::new(Line::from(text.to_string()).centered())
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(toast, popup_area);
}
