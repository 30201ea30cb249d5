use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        canvas::{Canvas, Map, MapResolution, Points},
        block::Title,
        Block, Borders, Clear, Padding, Paragraph, Wrap,
    },
};

use crate::app::{App, InputMode};
use crate::map_view::{MapRender, MapScene};
use crate::query_panel::PLACEHOLDER;

pub const LOADING_TEXT: &str = "Loading map...";

/// Points per catchment outline, as many as ratatui's own `Circle` uses.
const CATCHMENT_OUTLINE_STEPS: usize = 360;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    // Two panes: query on the left, map on the right
    let [query_area, map_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_query_pane(app, frame, query_area);
    render_map_pane(app, frame, map_area);
    render_footer(app, frame, footer_area);

    if app.show_details {
        render_outlet_details(app, frame, map_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Outlets in Kuala Lumpur ", Style::default().fg(Color::Yellow).bold()),
        Span::styled(format!(" {} ", app.api_url), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Red));
    frame.render_widget(header, area);
}

fn render_query_pane(app: &App, frame: &mut Frame, area: Rect) {
    let panel = &app.panel;
    let editing = app.input_mode == InputMode::Editing;

    let [input_area, answer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    // The submit affordance: dimmed while a submission is in flight.
    let glyph_style = if panel.form.is_submitting() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD)
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(" Ask ")
        .title(
            Title::from(Span::styled(format!(" {} ", panel.submit_glyph()), glyph_style))
                .alignment(Alignment::Right),
        );

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = panel.form.cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if panel.form.text().is_empty() && !editing {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = panel
            .form
            .text()
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), input_area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }

    // Omitted entirely when there is nothing to show.
    if let Some(answer) = panel.displayed_answer() {
        let answer = Paragraph::new(Text::from(answer))
            .block(Block::default().padding(Padding::horizontal(1)))
            .wrap(Wrap { trim: true });
        frame.render_widget(answer, answer_area);
    }
}

fn render_map_pane(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Map ");

    match app.map.render() {
        MapRender::Loading => {
            let placeholder = Paragraph::new(LOADING_TEXT)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(placeholder, area);
        }
        MapRender::Failed(reason) => {
            let placeholder = Paragraph::new(format!("Error: {reason}"))
                .style(Style::default().fg(Color::Red))
                .block(block);
            frame.render_widget(placeholder, area);
        }
        MapRender::Map(scene) => {
            let title = format!(
                " Map  z{}  {} outlets ",
                scene.viewport.zoom,
                scene.markers.len()
            );
            render_map_canvas(&scene, app.map.selected_index(), frame, area, block.title(title));
        }
    }
}

fn render_map_canvas(
    scene: &MapScene<'_>,
    selected: Option<usize>,
    frame: &mut Frame,
    area: Rect,
    block: Block<'_>,
) {
    let inner = block.inner(area);
    let (x_bounds, y_bounds) = scene.viewport.bounds(inner.width, inner.height);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: Color::DarkGray,
            });
            ctx.layer();

            for circle in &scene.circles {
                let outline = circle.outline(CATCHMENT_OUTLINE_STEPS);
                ctx.draw(&Points {
                    coords: &outline,
                    color: Color::Blue,
                });
            }
            ctx.layer();

            for (i, marker) in scene.markers.iter().enumerate() {
                let is_selected = selected == Some(i);
                let coords = [(marker.position.longitude, marker.position.latitude)];
                ctx.draw(&Points {
                    coords: &coords,
                    color: if is_selected { Color::Yellow } else { Color::Red },
                });
                if is_selected {
                    ctx.print(
                        marker.position.longitude,
                        marker.position.latitude,
                        Span::styled(
                            format!(" {}", marker.outlet.name),
                            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            }
        });

    frame.render_widget(canvas, area);
}

fn render_outlet_details(app: &App, frame: &mut Frame, area: Rect) {
    let Some(outlet) = app.map.selected_outlet() else {
        return;
    };

    // Calculate popup size and position (centered in the map pane)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 10.min(area.height.saturating_sub(2));
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Outlet (o to open Waze, Esc to close) ");

    let lines = vec![
        Line::from(Span::styled(
            outlet.name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(outlet.address.as_str()),
        Line::default(),
        Line::from(outlet.telephone.as_str()),
        Line::default(),
        Line::from(Span::styled(
            outlet.waze_link.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        )),
    ];

    let details = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(details, popup_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" MAP ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" ASK ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" n/p ", key_style),
                Span::styled(" outlet ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" details ", label_style),
            ];
            if app.map.selected_outlet().is_some() {
                hints.extend(vec![
                    Span::styled(" o ", key_style),
                    Span::styled(" waze ", label_style),
                    Span::styled(" c ", key_style),
                    Span::styled(" center ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" +/- ", key_style),
                Span::styled(" zoom ", label_style),
                Span::styled(" arrows ", key_style),
                Span::styled(" pan ", label_style),
                Span::styled(" i ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
    };

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
