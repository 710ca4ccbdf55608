use ratatui::{
    layout::{Constraint, Flex, Layout, Margin, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use super::{DisplayMessage, InputMode, TuiApp};

// Catppuccin Mocha
mod palette {
    use ratatui::style::Color;

    pub const BASE: Color = Color::Rgb(30, 30, 46);
    pub const MANTLE: Color = Color::Rgb(24, 24, 37);
    pub const CRUST: Color = Color::Rgb(17, 17, 27);
    pub const TEXT: Color = Color::Rgb(205, 214, 244);
    pub const SUBTEXT: Color = Color::Rgb(166, 173, 200);
    pub const MUTED: Color = Color::Rgb(127, 132, 156);
    pub const BORDER: Color = Color::Rgb(69, 71, 90);
    pub const SCROLL: Color = Color::Rgb(88, 91, 112);
    pub const LAVENDER: Color = Color::Rgb(180, 190, 254);
    pub const BLUE: Color = Color::Rgb(137, 180, 250);
    pub const MAUVE: Color = Color::Rgb(203, 166, 247);
    pub const YELLOW: Color = Color::Rgb(249, 226, 175);
    pub const GREEN: Color = Color::Rgb(166, 227, 161);
    pub const RED: Color = Color::Rgb(243, 139, 168);
}

const HELP: &[(&str, &str)] = &[
    ("i", "Type a message"),
    ("Enter", "Send message"),
    ("Esc", "Stop typing"),
    ("↑/↓", "Scroll conversation"),
    ("PgUp/PgDn", "Fast scroll"),
    ("?", "Toggle this help"),
    ("q", "Quit"),
];

pub(super) fn draw(f: &mut Frame, app: &TuiApp) {
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(32), Constraint::Min(0)]).areas(f.area());
    let [transcript, input, status] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(main);

    draw_sidebar(f, app, sidebar);
    draw_transcript(f, app, transcript);
    draw_input(f, app, input);
    draw_status(f, app, status);

    if app.show_help {
        draw_help(f);
    }
}

fn panel(title: Option<&str>, border: Color, bg: Color) -> Block<'static> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg));
    match title {
        Some(t) => block.title(Line::from(format!(" {} ", t)).fg(palette::TEXT).bold()),
        None => block,
    }
}

fn draw_sidebar(f: &mut Frame, app: &TuiApp, area: Rect) {
    let text = vec![
        Line::from(vec![
            Span::raw("💬 ").fg(palette::GREEN),
            Span::raw(format!("{} Info", app.branding.name)).fg(palette::LAVENDER).bold(),
        ]),
        Line::from(""),
        Line::from(app.branding.blurb.clone()).fg(palette::SUBTEXT),
    ];
    let sidebar = Paragraph::new(text)
        .block(panel(None, palette::BORDER, palette::MANTLE))
        .wrap(Wrap { trim: true });
    f.render_widget(sidebar, area);
}

fn speaker<'a>(msg: &DisplayMessage, persona: &'a str) -> (&'a str, Color, &'static str) {
    match msg.role.as_str() {
        "user" => ("You", palette::BLUE, "❯"),
        "assistant" => (persona, palette::MAUVE, "●"),
        "tool" => ("Tool", palette::YELLOW, "🔧"),
        "tool_result" => ("Result", palette::GREEN, "✓"),
        "error" => ("Error", palette::RED, "✗"),
        _ => ("?", palette::TEXT, "?"),
    }
}

/// Flattens the transcript into lines and records where each message starts,
/// so scrolling moves a whole message at a time.
fn transcript_lines(app: &TuiApp) -> (Vec<Line<'static>>, Vec<usize>) {
    let mut lines = Vec::new();
    let mut starts = Vec::with_capacity(app.messages.len());

    for msg in &app.messages {
        let (label, color, icon) = speaker(msg, &app.branding.name);
        starts.push(lines.len());
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", icon)).fg(color),
            Span::raw(label.to_string()).fg(color).bold(),
            Span::raw(" │ ").fg(palette::BORDER),
            Span::raw(msg.timestamp.clone()).fg(palette::MUTED),
        ]));
        lines.extend(
            msg.content
                .lines()
                .map(|l| Line::from(format!("  {}", l)).fg(palette::TEXT)),
        );
        lines.push(Line::from(""));
    }
    (lines, starts)
}

/// Row of the first message in view once every line above it has been
/// wrapped to `width` columns.
fn scroll_row(lines: &[Line<'static>], starts: &[usize], offset: usize, width: u16) -> u16 {
    let first = starts.get(offset).copied().unwrap_or(0).min(lines.len());
    let above = Paragraph::new(lines[..first].to_vec()).wrap(Wrap { trim: false });
    u16::try_from(above.line_count(width)).unwrap_or(u16::MAX)
}

/// Scroll row for the transcript of `app` drawn `width` columns wide.
pub(crate) fn transcript_scroll_row(app: &TuiApp, width: u16) -> u16 {
    let (lines, starts) = transcript_lines(app);
    scroll_row(&lines, &starts, app.scroll_offset, width)
}

fn draw_transcript(f: &mut Frame, app: &TuiApp, area: Rect) {
    let (lines, starts) = transcript_lines(app);
    // Inside the borders.
    let top = scroll_row(&lines, &starts, app.scroll_offset, area.width.saturating_sub(2));

    let transcript = Paragraph::new(Text::from(lines))
        .block(panel(Some("Conversation"), palette::BORDER, palette::BASE))
        .wrap(Wrap { trim: false })
        .scroll((top, 0));
    f.render_widget(transcript, area);

    let mut state = ScrollbarState::new(app.messages.len()).position(app.scroll_offset);
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .style(Style::default().fg(palette::SCROLL))
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    f.render_stateful_widget(
        scrollbar,
        area.inner(Margin { vertical: 1, horizontal: 0 }),
        &mut state,
    );
}

fn draw_input(f: &mut Frame, app: &TuiApp, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let line = if editing {
        Line::from(vec![
            Span::raw("❯ ").fg(palette::BLUE).bold(),
            Span::raw(app.input.clone()).fg(palette::TEXT),
            Span::raw("█").fg(palette::LAVENDER),
        ])
    } else {
        Line::from(
            Span::raw("  What is up? Press 'i' to ask...")
                .fg(palette::MUTED)
                .italic(),
        )
    };

    let (title, border) = if editing {
        ("Input", palette::BLUE)
    } else {
        ("Ready", palette::BORDER)
    };
    let input = Paragraph::new(line)
        .block(panel(Some(title), border, palette::MANTLE))
        .wrap(Wrap { trim: false });
    f.render_widget(input, area);
}

fn draw_status(f: &mut Frame, app: &TuiApp, area: Rect) {
    let status = Paragraph::new(Line::from(format!("  {}", app.status_line)).fg(palette::TEXT))
        .block(panel(None, palette::BORDER, palette::CRUST));
    f.render_widget(status, area);
}

fn draw_help(f: &mut Frame) {
    let [row] = Layout::vertical([Constraint::Percentage(50)])
        .flex(Flex::Center)
        .areas(f.area());
    let [area] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(row);

    let mut text = vec![Line::from("  Keybindings:").fg(palette::BLUE).bold()];
    text.extend(HELP.iter().map(|(key, what)| {
        Line::from(vec![
            Span::raw(format!("    {:<11}", key)).fg(palette::MAUVE),
            Span::raw(format!("- {}", what)),
        ])
    }));
    text.push(Line::from(""));
    text.push(
        Line::from("  Press '?' to close")
            .fg(palette::MUTED)
            .italic(),
    );

    let help = Paragraph::new(text)
        .block(panel(Some("❓ Help"), palette::LAVENDER, palette::BASE))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}
