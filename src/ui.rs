use crate::core::{NavLink, Route, WrappedCore, nav_links};
use crate::model::{Theme, TrackRecord};
use crate::stats::{AggregateSummary, ListenPhase, ListenDataStore};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};
use time::OffsetDateTime;

const BRAND: &str = "monthlyWrapped";
pub const FAILURE_INDICATOR: &str = "couldn't load your listens";
const LOADING_TEXT: &str = "loading your listens...";

#[derive(Clone, Copy)]
struct ThemePalette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Dark => ThemePalette {
            bg: Color::Rgb(10, 15, 24),
            panel_bg: Color::Rgb(19, 29, 43),
            panel_alt_bg: Color::Rgb(24, 38, 58),
            border: Color::Rgb(69, 121, 176),
            text: Color::Rgb(214, 228, 248),
            muted: Color::Rgb(149, 173, 204),
            accent: Color::Rgb(30, 215, 96),
            alert: Color::Rgb(249, 174, 88),
            selected_bg: Color::Rgb(34, 55, 82),
        },
        Theme::PitchBlack => ThemePalette {
            bg: Color::Rgb(0, 0, 0),
            panel_bg: Color::Rgb(8, 8, 8),
            panel_alt_bg: Color::Rgb(15, 15, 15),
            border: Color::Rgb(74, 74, 74),
            text: Color::Rgb(242, 242, 242),
            muted: Color::Rgb(150, 150, 150),
            accent: Color::Rgb(212, 212, 212),
            alert: Color::Rgb(235, 176, 97),
            selected_bg: Color::Rgb(26, 26, 26),
        },
        Theme::Galaxy => ThemePalette {
            bg: Color::Rgb(7, 8, 23),
            panel_bg: Color::Rgb(18, 16, 44),
            panel_alt_bg: Color::Rgb(27, 25, 61),
            border: Color::Rgb(108, 107, 205),
            text: Color::Rgb(227, 225, 252),
            muted: Color::Rgb(167, 165, 210),
            accent: Color::Rgb(141, 204, 255),
            alert: Color::Rgb(255, 189, 121),
            selected_bg: Color::Rgb(40, 37, 86),
        },
        Theme::CottonCandy => ThemePalette {
            bg: Color::Rgb(34, 21, 44),
            panel_bg: Color::Rgb(51, 29, 68),
            panel_alt_bg: Color::Rgb(66, 38, 86),
            border: Color::Rgb(245, 146, 208),
            text: Color::Rgb(255, 233, 250),
            muted: Color::Rgb(224, 173, 219),
            accent: Color::Rgb(124, 225, 255),
            alert: Color::Rgb(255, 199, 150),
            selected_bg: Color::Rgb(90, 49, 114),
        },
    }
}

pub fn draw(frame: &mut Frame, core: &WrappedCore, command: Option<&str>) {
    let colors = palette(core.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, core, vertical[0], &colors);

    match core.route {
        Route::Home => draw_home(frame, core, vertical[1], &colors),
        Route::Tracks => draw_tracks(frame, core, vertical[1], &colors),
        Route::Login => draw_login(frame, vertical[1], &colors),
        Route::About => draw_about(frame, vertical[1], &colors),
    }

    let footer_line = match command {
        Some(buffer) => Line::from(vec![
            Span::styled(":", Style::default().fg(colors.accent)),
            Span::styled(buffer.to_string(), Style::default().fg(colors.text)),
        ]),
        None => Line::from(vec![
            Span::styled(footer_hint(core.route), Style::default().fg(colors.muted)),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
        ]),
    };
    let footer = Paragraph::new(footer_line).block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, vertical[2]);
}

fn draw_header(frame: &mut Frame, core: &WrappedCore, area: Rect, colors: &ThemePalette) {
    frame.render_widget(
        panel_block("", colors.panel_bg, colors.text, colors.border),
        area,
    );
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let brand = Paragraph::new(Line::from(vec![
        Span::styled(
            BRAND,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", month_label(OffsetDateTime::now_local().ok())),
            Style::default().fg(colors.muted),
        ),
    ]));
    frame.render_widget(brand, chunks[0]);

    let nav = Paragraph::new(nav_line(core, colors)).alignment(Alignment::Right);
    frame.render_widget(nav, chunks[1]);
}

fn nav_line(core: &WrappedCore, colors: &ThemePalette) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, link) in nav_links(&core.session).into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("   ", Style::default()));
        }
        let mut style = Style::default().fg(colors.text);
        if link == NavLink::Page(core.route) {
            style = style
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        spans.push(Span::styled(link.label(), style));
    }
    Line::from(spans)
}

/// `october 2026` for the local clock, falling back to UTC.
pub fn month_label(now: Option<OffsetDateTime>) -> String {
    let now = now.unwrap_or_else(OffsetDateTime::now_utc);
    format!(
        "{} {}",
        now.month().to_string().to_lowercase(),
        now.year()
    )
}

fn draw_home(frame: &mut Frame, core: &WrappedCore, area: Rect, colors: &ThemePalette) {
    let block = panel_block("this month", colors.panel_bg, colors.text, colors.border);
    let Some(summary) = ready_or_placeholder(frame, core.store(), block.clone(), area, colors)
    else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("hi there, {}!", core.session.display_name),
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (idx, text) in summary_lines(&summary).into_iter().enumerate() {
        let style = if idx % 2 == 0 {
            Style::default().fg(colors.muted)
        } else {
            Style::default()
                .fg(colors.text)
                .add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(text, style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "see how your listening time is split up",
        Style::default().fg(colors.muted),
    )));
    lines.push(Line::from(Span::styled(
        "[ --> ]  press Enter",
        Style::default().fg(colors.alert),
    )));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// The alternating caption/figure lines of the monthly summary.
pub fn summary_lines(summary: &AggregateSummary) -> Vec<String> {
    vec![
        String::from("this month, you've listened to"),
        format!("{} tracks", summary.total_tracks),
        String::from("a combined"),
        format!("{} times", summary.total_listens),
        String::from("for a total of"),
        summary.time().to_string(),
    ]
}

fn draw_tracks(frame: &mut Frame, core: &WrappedCore, area: Rect, colors: &ThemePalette) {
    let title = format!("tracks, sorted by {}", core.sort().label());
    let block = panel_block(&title, colors.panel_alt_bg, colors.text, colors.border);
    if ready_or_placeholder(frame, core.store(), block.clone(), area, colors).is_none() {
        return;
    }
    let Some(data) = core.store().and_then(ListenDataStore::data) else {
        return;
    };

    let header = Row::new(
        ["Album Art", "Title", "Listen Count", "Time Listened (s)"]
            .into_iter()
            .map(Cell::from),
    )
    .style(
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = data
        .sorted()
        .map(|record| {
            Row::new(track_cells(record).map(Cell::from)).style(Style::default().fg(colors.text))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Percentage(36),
            Constraint::Length(14),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(colors.selected_bg)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("-> ");

    let mut state = TableState::default();
    state.select((!data.is_empty()).then_some(core.selected_row()));
    frame.render_stateful_widget(table, area, &mut state);
}

pub fn track_cells(record: &TrackRecord) -> [String; 4] {
    [
        record.album_art_url.clone(),
        record.title.clone(),
        record.listen_count.to_string(),
        record.time_listened_seconds.to_string(),
    ]
}

/// Draws the loading or failure placeholder and returns `None`, or hands back
/// the summary when the page has data.
fn ready_or_placeholder(
    frame: &mut Frame,
    store: Option<&ListenDataStore>,
    block: Block<'_>,
    area: Rect,
    colors: &ThemePalette,
) -> Option<AggregateSummary> {
    let lines = match store.map(ListenDataStore::phase) {
        Some(ListenPhase::Ready(data)) => return Some(data.summary()),
        Some(ListenPhase::Error(message)) => vec![
            Line::from(Span::styled(
                FAILURE_INDICATOR,
                Style::default()
                    .fg(colors.alert)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                message.clone(),
                Style::default().fg(colors.muted),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "revisit the page to try again",
                Style::default().fg(colors.muted),
            )),
        ],
        Some(ListenPhase::Idle | ListenPhase::Loading) | None => vec![Line::from(Span::styled(
            LOADING_TEXT,
            Style::default().fg(colors.muted),
        ))],
    };
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
    None
}

fn draw_login(frame: &mut Frame, area: Rect, colors: &ThemePalette) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "all your listens this month.",
            Style::default()
                .fg(colors.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "all in one place.",
            Style::default()
                .fg(colors.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[ start tracking ]",
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "press Enter to log in with Spotify",
            Style::default().fg(colors.muted),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(panel_block("login", colors.panel_bg, colors.text, colors.border)),
        area,
    );
}

fn draw_about(frame: &mut Frame, area: Rect, colors: &ThemePalette) {
    let lines = vec![
        Line::from(Span::styled(
            BRAND,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "A monthly look at what you've been playing on Spotify: how many tracks, how many plays and how long you spent listening.",
            Style::default().fg(colors.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "h home   t tracks   a about   l login   o logout",
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            "s cycle sort   1 listens   2 time   3 title   : command   q quit",
            Style::default().fg(colors.muted),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block("about", colors.panel_bg, colors.text, colors.border))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn footer_hint(route: Route) -> &'static str {
    match route {
        Route::Home => "Enter tracks, t tracks, a about, o logout, q quit",
        Route::Tracks => "Up/Down select, s sort, 1/2/3 sort by, h home, q quit",
        Route::Login => "Enter start tracking, a about, q quit",
        Route::About => "h home, l login, q quit",
    }
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg));
    if title.is_empty() {
        return block;
    }
    block.title(Span::styled(
        format!(" {title} "),
        Style::default().fg(text).add_modifier(Modifier::BOLD),
    ))
}
