pub mod fields;
pub mod theme;

use crate::app::{AppModel, GridView, MAX_VISIBLE_THREADS, ThreadSelectorState, View};
use crate::ui::fields::{RenderContext, RenderedField, get_field_renderer};
use ratatui::prelude::*;
use ratatui::widgets::*;
use unicode_width::UnicodeWidthStr;

const MIN_COLUMN_WIDTH: usize = 6;
const MAX_COLUMN_WIDTH: usize = 32;

pub fn render(frame: &mut Frame, model: &AppModel) {
    let full_area = frame.area();
    if full_area.width == 0 || full_area.height == 0 {
        return;
    }

    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG)),
        full_area,
    );
    render_menu_bar(frame, full_area, model);

    let content_area = if full_area.height > 1 {
        Rect {
            x: full_area.x,
            y: full_area.y.saturating_add(1),
            width: full_area.width,
            height: full_area.height.saturating_sub(1),
        }
    } else {
        full_area
    };

    match &model.view {
        View::Grid(grid) => render_grid(frame, content_area, model, grid),
        View::Error => render_error(frame, content_area, model),
    }

    if let Some(selector) = &model.thread_selector {
        render_thread_selector_overlay(frame, content_area, selector);
    }

    if model.help_open {
        render_help_overlay(frame, content_area);
    }
}

fn render_menu_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let bar_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 1,
    };

    let base_style = Style::default().fg(theme::FG).bg(theme::BAR_BG);
    let hint_style = Style::default().fg(theme::DIM).bg(theme::BAR_BG);

    let title = " ◆ evgrid ";
    let org = if model.data.organization.slug.is_empty() {
        String::new()
    } else {
        format!("org: {}", model.data.organization.slug)
    };
    let hint = "(F1 help)";

    let used = UnicodeWidthStr::width(title)
        + UnicodeWidthStr::width(org.as_str())
        + UnicodeWidthStr::width("  ")
        + UnicodeWidthStr::width(hint);
    let remaining = (bar_area.width as usize).saturating_sub(used);

    let spans = vec![
        Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme::ACCENT)
                .bg(theme::BAR_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(org, base_style),
        Span::styled("  ".to_string(), base_style),
        Span::styled(hint.to_string(), hint_style),
        Span::styled(" ".repeat(remaining), base_style),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base_style), bar_area);
}

fn render_error(frame: &mut Frame, area: Rect, model: &AppModel) {
    let area = inner_area(area);
    let error_text = model
        .data
        .load_error
        .clone()
        .unwrap_or_else(|| "unknown error".to_string());

    let paragraph = Paragraph::new(vec![
        Line::from("Failed to load the event dataset."),
        Line::from(""),
        Line::from(format!(
            "Dataset path: {}",
            model.data.dataset_path.display()
        )),
        Line::from(""),
        Line::from(format!("Error: {error_text}")),
        Line::from(""),
        Line::from("Keys: Ctrl+R=reload  Esc=quit  Ctrl+Q/Ctrl+C=quit"),
    ])
    .block(
        Block::default()
            .title("evgrid")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER))
            .padding(Padding::horizontal(1)),
    );

    frame.render_widget(paragraph, area);
}

fn render_grid(frame: &mut Frame, area: Rect, model: &AppModel, grid: &GridView) {
    let area = inner_area(area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let table_area = chunks[0];
    let footer_area = chunks[1];

    let context = RenderContext {
        organization: &model.data.organization,
        projects: &model.data.projects,
    };

    let renderers: Vec<_> = model
        .data
        .fields
        .iter()
        .map(|field| get_field_renderer(field, &model.data.meta))
        .collect();

    let order = model.row_order();
    if order.is_empty() {
        let empty = Paragraph::new("No events in the dataset.").block(grid_block());
        frame.render_widget(empty, table_area);
        render_footer(frame, footer_area, model, grid, None);
        return;
    }

    // Render every cell once, then size columns from the content.
    let rendered_rows: Vec<Vec<RenderedField>> = order
        .iter()
        .map(|&index| {
            let row = &model.data.events[index].data;
            renderers
                .iter()
                .map(|renderer| renderer(row, &context))
                .collect()
        })
        .collect();

    let headers: Vec<String> = model
        .data
        .fields
        .iter()
        .map(|field| header_label(field, grid))
        .collect();
    let widths = column_widths(&headers, &rendered_rows);

    let visible_height = (table_area.height as usize)
        .saturating_sub(3)
        .max(1);
    let row_offset = scroll_offset(grid.selected_row, visible_height);

    let header_row = Row::new(headers.iter().enumerate().map(|(col, header)| {
        let style = if col == grid.selected_col {
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(theme::MUTED)
                .add_modifier(Modifier::BOLD)
        };
        Cell::from(Span::styled(header.clone(), style))
    }))
    .height(1);

    let rows = rendered_rows
        .iter()
        .enumerate()
        .skip(row_offset)
        .take(visible_height)
        .map(|(row_index, cells)| {
            let selected_row = row_index == grid.selected_row;
            Row::new(cells.iter().enumerate().map(|(col, cell)| {
                let mut line = cell.line.clone().alignment(cell.align);
                if selected_row && col == grid.selected_col {
                    line = line.style(
                        Style::default()
                            .bg(theme::SURFACE)
                            .add_modifier(Modifier::BOLD),
                    );
                } else if selected_row {
                    line = line.style(Style::default().bg(theme::BAR_BG));
                }
                Cell::from(line)
            }))
        });

    let constraints: Vec<Constraint> = widths
        .iter()
        .map(|&width| Constraint::Length(width as u16))
        .collect();

    let table = Table::new(rows, constraints)
        .header(header_row)
        .block(grid_block())
        .column_spacing(2);

    frame.render_widget(table, table_area);

    let selected_cell = rendered_rows
        .get(grid.selected_row)
        .and_then(|cells| cells.get(grid.selected_col));
    render_footer(frame, footer_area, model, grid, selected_cell);
}

fn grid_block() -> Block<'static> {
    Block::default()
        .title("Events")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(1))
}

fn header_label(field: &str, grid: &GridView) -> String {
    match &grid.sort {
        Some(sort) if sort.field == field => {
            format!("{field} {}", sort.direction.indicator())
        }
        _ => field.to_string(),
    }
}

/// Column widths from content, clamped so one long value cannot starve the
/// rest of the grid.
fn column_widths(headers: &[String], rows: &[Vec<RenderedField>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let content = rows
                .iter()
                .filter_map(|cells| cells.get(col))
                .map(|cell| UnicodeWidthStr::width(cell.text().as_str()))
                .max()
                .unwrap_or(0);
            content
                .max(UnicodeWidthStr::width(header.as_str()))
                .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn scroll_offset(selected: usize, visible_height: usize) -> usize {
    if selected >= visible_height {
        selected - visible_height + 1
    } else {
        0
    }
}

fn render_footer(
    frame: &mut Frame,
    area: Rect,
    model: &AppModel,
    grid: &GridView,
    selected_cell: Option<&RenderedField>,
) {
    let total = model.data.events.len();
    let mut position = format!(
        " {}/{}  ·  {} ",
        if total == 0 { 0 } else { grid.selected_row + 1 },
        total,
        model.selected_field().unwrap_or("-"),
    );
    if model.data.projects.loading {
        position.push_str(" ·  resolving projects… ");
    }

    let detail = if let Some(notice) = &model.notice {
        Span::styled(notice.clone(), Style::default().fg(theme::WARN))
    } else if let Some(cell) = selected_cell {
        if let Some(link) = &cell.link {
            Span::styled(format!("→ {link}"), Style::default().fg(theme::LINK))
        } else if let Some(tooltip) = &cell.tooltip {
            Span::styled(tooltip.clone(), Style::default().fg(theme::MUTED))
        } else {
            Span::styled(
                "j/k move  h/l column  s sort  t threads  y copy id",
                Style::default().fg(theme::DIM),
            )
        }
    } else {
        Span::styled(
            "j/k move  h/l column  s sort  t threads  y copy id",
            Style::default().fg(theme::DIM),
        )
    };

    let footer = Paragraph::new(vec![
        Line::from(Span::styled(position, Style::default().fg(theme::MUTED))),
        Line::from(vec![Span::raw(" "), detail]),
    ]);
    frame.render_widget(footer, area);
}

fn render_thread_selector_overlay(frame: &mut Frame, area: Rect, selector: &ThreadSelectorState) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let visible = selector.visible_entries();
    let list_height = visible.len().clamp(1, MAX_VISIBLE_THREADS) as u16;
    // borders + search line + separator + list
    let popup_height = list_height.saturating_add(4).min(area.height);
    let popup_width = (area.width.saturating_sub(4)).min(64).max(24);
    let popup = centered_rect(area, popup_width, popup_height);

    frame.render_widget(Clear, popup);

    let title = format!("Threads — {}", selector.event_id);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(1))
        .title(title);

    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    if inner.height == 0 {
        return;
    }

    let search_area = Rect { height: 1, ..inner };
    let search = if selector.filter.is_empty() {
        Line::from(Span::styled(
            "Type to filter threads…",
            Style::default().fg(theme::DIM),
        ))
    } else {
        Line::from(vec![
            Span::styled("/ ", Style::default().fg(theme::DIM)),
            Span::raw(selector.filter.clone()),
        ])
    };
    frame.render_widget(Paragraph::new(search), search_area);

    if inner.height <= 2 {
        return;
    }
    let list_area = Rect {
        x: inner.x,
        y: inner.y + 2,
        width: inner.width,
        height: inner.height - 2,
    };

    if visible.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No matching threads.",
                Style::default().fg(theme::DIM),
            )),
            list_area,
        );
        return;
    }

    let max_width = list_area.width as usize;
    let items: Vec<ListItem> = visible
        .iter()
        .skip(selector.offset)
        .take(list_area.height as usize)
        .map(|entry| {
            let active = selector.active_thread_id == Some(entry.thread_id);
            let marker = if active { "● " } else { "○ " };
            let marker_style = if active {
                Style::default().fg(theme::ACCENT)
            } else {
                Style::default().fg(theme::DIM)
            };

            let mut spans = vec![
                Span::styled(marker, marker_style),
                Span::styled(entry.label.clone(), Style::default().fg(theme::FG)),
            ];
            if let Some(info) = &entry.info {
                spans.push(Span::styled(
                    format!("  {info}"),
                    Style::default().fg(theme::MUTED),
                ));
            }
            if entry.crashed {
                let exception = entry
                    .exception
                    .as_deref()
                    .unwrap_or("crashed");
                spans.push(Span::styled(
                    format!("  ✗ {exception}"),
                    Style::default().fg(theme::ERROR),
                ));
            }

            let text: String = spans.iter().map(|span| span.content.as_ref()).collect();
            if UnicodeWidthStr::width(text.as_str()) > max_width {
                ListItem::new(Line::from(truncate_end(&text, max_width)))
            } else {
                ListItem::new(Line::from(spans))
            }
        })
        .collect();

    let list = List::new(items).highlight_style(
        Style::default()
            .add_modifier(Modifier::REVERSED)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    state.select(Some(selector.selected.saturating_sub(selector.offset)));
    frame.render_stateful_widget(list, list_area, &mut state);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Grid",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  j/k or ↓/↑      move between events"),
        Line::from("  h/l or ←/→      move between columns"),
        Line::from("  Home/End        jump to first/last event"),
        Line::from("  s               sort by the current column"),
        Line::from("  y               copy the event id"),
        Line::from("  t or Enter      open the thread selector"),
        Line::from(""),
        Line::from(Span::styled(
            "Thread selector",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  type            filter threads"),
        Line::from("  Enter           pick the highlighted thread"),
        Line::from("  Esc             close without picking"),
        Line::from(""),
        Line::from("  Ctrl+R reload  ·  q/Ctrl+Q quit"),
    ];

    let popup_height = (lines.len() as u16).saturating_add(2).min(area.height);
    let popup_width = 52.min(area.width);
    let popup = centered_rect(area, popup_width, popup_height);

    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER))
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(paragraph, popup);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

// Breathing room between the terminal edge and the content.
fn inner_area(area: Rect) -> Rect {
    if area.width < 4 || area.height < 2 {
        return area;
    }
    Rect {
        x: area.x + 1,
        y: area.y,
        width: area.width - 2,
        height: area.height,
    }
}

fn truncate_end(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let available = max_width.saturating_sub(UnicodeWidthStr::width(ellipsis));
    let mut out = String::new();
    for ch in text.chars() {
        let next = format!("{out}{ch}");
        if UnicodeWidthStr::width(next.as_str()) > available {
            break;
        }
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}
