use crate::domain::{
    EventRow, FieldType, MISERY_PALETTE_SIZE, MetaTypes, Organization, ProjectLookup,
    aggregate_alias, compute_misery, find_misery_field, special_field_sort_key,
};
use crate::ui::theme;
use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

const PLACEHOLDER: &str = "n/a";
const ID_PREVIEW_WIDTH: usize = 8;

/// Context every render call receives from the host view.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub organization: &'a Organization,
    pub projects: &'a ProjectLookup,
}

/// A rendered grid cell: styled content plus the detail the footer shows
/// for the selected cell.
#[derive(Clone, Debug, Default)]
pub struct RenderedField {
    pub line: Line<'static>,
    pub align: Alignment,
    pub tooltip: Option<String>,
    pub link: Option<String>,
}

impl RenderedField {
    fn cell(line: Line<'static>) -> Self {
        Self {
            line,
            align: Alignment::Left,
            tooltip: None,
            link: None,
        }
    }

    fn numeric(line: Line<'static>) -> Self {
        Self {
            line,
            align: Alignment::Right,
            tooltip: None,
            link: None,
        }
    }

    fn empty() -> Self {
        Self::cell(Line::default())
    }

    fn placeholder() -> Self {
        Self::cell(Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(theme::DIM),
        )))
    }

    fn numeric_placeholder() -> Self {
        Self {
            align: Alignment::Right,
            ..Self::placeholder()
        }
    }

    fn with_tooltip(mut self, tooltip: String) -> Self {
        self.tooltip = Some(tooltip);
        self
    }

    fn with_link(mut self, link: String) -> Self {
        self.link = Some(link);
        self
    }

    /// Plain-text content, for the headless `render` subcommand and tests.
    pub fn text(&self) -> String {
        self.line
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }
}

type RenderFn = fn(&str, &EventRow, &RenderContext) -> RenderedField;
type SpecialRenderFn = fn(&EventRow, &RenderContext) -> RenderedField;

/// Generic per-type rendering strategy plus its sortability flag.
#[derive(Clone, Copy)]
pub struct FieldFormatter {
    pub sortable: bool,
    pub render: RenderFn,
}

/// Per-field override that bypasses the generic type formatter.
#[derive(Clone, Copy)]
pub struct SpecialField {
    pub sort_field: Option<&'static str>,
    pub render: SpecialRenderFn,
}

/// A render function bound to one field name.
pub type FieldRenderer = Box<dyn Fn(&EventRow, &RenderContext) -> RenderedField>;

/// The fixed type→strategy table. Unknown types are simply not in it; the
/// resolver falls back to the string formatter.
pub fn field_formatter(field_type: FieldType) -> FieldFormatter {
    let render: RenderFn = match field_type {
        FieldType::Boolean => render_boolean,
        FieldType::Date => render_date,
        FieldType::Duration => render_duration,
        FieldType::Integer => render_integer,
        FieldType::Number => render_number,
        FieldType::Percentage => render_percentage,
        FieldType::String => render_string,
    };
    FieldFormatter {
        sortable: true,
        render,
    }
}

/// Per-field overrides that need cross-referenced data or custom links.
pub fn special_field(field: &str) -> Option<SpecialField> {
    let render: SpecialRenderFn = match field {
        "id" => render_event_id,
        "issue.id" => render_issue_id,
        "issue" => render_issue,
        "project" => render_project,
        "user" => render_user,
        "release" => render_release,
        _ => return None,
    };
    Some(SpecialField {
        sort_field: special_field_sort_key(field).flatten(),
        render,
    })
}

/// Overrides for computed columns, keyed by aggregate-name prefix.
pub fn special_function(function: &str) -> Option<SpecialRenderFn> {
    function
        .starts_with("user_misery")
        .then_some(render_user_misery as SpecialRenderFn)
}

/// Picks the rendering strategy for `field`: special fields first, then
/// special functions (matched against the aggregate alias), then the
/// meta-declared type, else string rendering.
pub fn get_field_renderer(field: &str, meta: &MetaTypes) -> FieldRenderer {
    if let Some(special) = special_field(field) {
        let render = special.render;
        return Box::new(move |row, context| render(row, context));
    }

    if let Some(render) = special_function(&aggregate_alias(field)) {
        return Box::new(move |row, context| render(row, context));
    }

    let formatter = meta
        .get(field)
        .copied()
        .map_or_else(|| field_formatter(FieldType::String), field_formatter);
    let field = field.to_string();
    Box::new(move |row, context| (formatter.render)(&field, row, context))
}

fn render_boolean(field: &str, row: &EventRow, _context: &RenderContext) -> RenderedField {
    let truthy = match row.get(field) {
        Some(Value::Bool(value)) => *value,
        Some(Value::Number(value)) => value.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(value)) => !value.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    };
    let label = if truthy { "yes" } else { "no" };
    RenderedField::cell(Line::from(Span::styled(
        label,
        Style::default().fg(theme::FG),
    )))
}

fn render_date(field: &str, row: &EventRow, _context: &RenderContext) -> RenderedField {
    match row.text(field) {
        Some(value) if !value.is_empty() => {
            let display = format_timestamp(value).unwrap_or_else(|| value.to_string());
            RenderedField::cell(Line::from(Span::styled(
                display,
                Style::default().fg(theme::MUTED),
            )))
            .with_tooltip(value.to_string())
        }
        _ => RenderedField::placeholder(),
    }
}

fn render_duration(field: &str, row: &EventRow, _context: &RenderContext) -> RenderedField {
    match row.number(field) {
        Some(milliseconds) => RenderedField::numeric(Line::from(Span::styled(
            format_duration_ms(milliseconds),
            Style::default().fg(theme::FG),
        ))),
        None => RenderedField::numeric_placeholder(),
    }
}

fn render_integer(field: &str, row: &EventRow, _context: &RenderContext) -> RenderedField {
    match row.number(field) {
        Some(value) => RenderedField::numeric(Line::from(Span::styled(
            format_grouped(value),
            Style::default().fg(theme::FG),
        ))),
        None => RenderedField::numeric_placeholder(),
    }
}

fn render_number(field: &str, row: &EventRow, _context: &RenderContext) -> RenderedField {
    match row.number(field) {
        Some(value) => RenderedField::numeric(Line::from(Span::styled(
            format_float(value),
            Style::default().fg(theme::FG),
        ))),
        None => RenderedField::numeric_placeholder(),
    }
}

fn render_percentage(field: &str, row: &EventRow, _context: &RenderContext) -> RenderedField {
    match row.number(field) {
        Some(value) => RenderedField::numeric(Line::from(Span::styled(
            format_percentage(value),
            Style::default().fg(theme::FG),
        ))),
        None => RenderedField::numeric_placeholder(),
    }
}

// Array values may be long unbounded sequences; only the tail is shown.
fn render_string(field: &str, row: &EventRow, _context: &RenderContext) -> RenderedField {
    let value = match row.items(field) {
        Some(items) => items.last().map(value_text),
        None => match row.get(field) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value_text(value)),
        },
    };
    match value {
        Some(text) => RenderedField::cell(Line::from(Span::styled(
            text,
            Style::default().fg(theme::FG),
        ))),
        None => RenderedField::placeholder(),
    }
}

fn render_event_id(row: &EventRow, _context: &RenderContext) -> RenderedField {
    // Only string ids are identifiers worth surfacing.
    let Some(id) = row.text("id") else {
        return RenderedField::empty();
    };
    let preview: String = id.chars().take(ID_PREVIEW_WIDTH).collect();
    RenderedField::cell(Line::from(Span::styled(
        preview,
        Style::default().fg(theme::ACCENT),
    )))
    .with_tooltip(format!("{id} (y copies the full id)"))
}

fn issue_link(organization: &Organization, issue_id: &str) -> String {
    format!("/organizations/{}/issues/{issue_id}/", organization.slug)
}

fn render_issue_id(row: &EventRow, context: &RenderContext) -> RenderedField {
    match row.get("issue.id").map(value_text) {
        Some(issue_id) if !issue_id.is_empty() => {
            let link = issue_link(context.organization, &issue_id);
            RenderedField::cell(Line::from(Span::styled(
                issue_id,
                Style::default()
                    .fg(theme::LINK)
                    .add_modifier(Modifier::UNDERLINED),
            )))
            .with_link(link)
        }
        _ => RenderedField::placeholder(),
    }
}

fn render_issue(row: &EventRow, context: &RenderContext) -> RenderedField {
    let Some(short_id) = row.get("issue").map(value_text).filter(|s| !s.is_empty()) else {
        return RenderedField::placeholder();
    };

    let badge = Span::styled(
        short_id,
        Style::default()
            .fg(theme::ACCENT)
            .add_modifier(Modifier::BOLD),
    );

    // Without the numeric id there is nothing to link to; the badge stands
    // alone.
    match row.get("issue.id").map(value_text).filter(|s| !s.is_empty()) {
        Some(issue_id) => RenderedField::cell(Line::from(badge))
            .with_link(issue_link(context.organization, &issue_id)),
        None => RenderedField::cell(Line::from(badge)),
    }
}

fn render_project(row: &EventRow, context: &RenderContext) -> RenderedField {
    let Some(slug) = row.get("project").map(value_text).filter(|s| !s.is_empty()) else {
        return RenderedField::placeholder();
    };

    match context.projects.get(&slug) {
        Some(project) => {
            let mut spans = vec![Span::styled(
                format!("▣ {}", project.slug),
                Style::default().fg(theme::ACCENT),
            )];
            if let Some(platform) = &project.platform {
                spans.push(Span::styled(
                    format!(" ({platform})"),
                    Style::default().fg(theme::DIM),
                ));
            }
            RenderedField::cell(Line::from(spans)).with_tooltip(format!("project #{}", project.id))
        }
        // Unresolved (still loading or unknown): badge carries the slug
        // alone.
        None => RenderedField::cell(Line::from(Span::styled(
            format!("▣ {slug}"),
            Style::default().fg(theme::MUTED),
        ))),
    }
}

fn render_user(row: &EventRow, _context: &RenderContext) -> RenderedField {
    match row.get("user").map(value_text).filter(|s| !s.is_empty()) {
        // The single user field stands in for id, name, email, and
        // username alike.
        Some(user) => RenderedField::cell(Line::from(Span::styled(
            format!("◉ {user}"),
            Style::default().fg(theme::FG),
        )))
        .with_tooltip(format!("user {user}")),
        None => RenderedField::cell(Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(theme::DIM).add_modifier(Modifier::DIM),
        ))),
    }
}

fn render_release(row: &EventRow, _context: &RenderContext) -> RenderedField {
    match row.text("release") {
        Some(version) if !version.is_empty() => RenderedField::cell(Line::from(Span::styled(
            format!("⎇ {version}"),
            Style::default().fg(theme::SUCCESS),
        )))
        .with_tooltip(format!("release {version}")),
        _ => RenderedField::empty(),
    }
}

fn render_user_misery(row: &EventRow, _context: &RenderContext) -> RenderedField {
    let Some(misery_field) = find_misery_field(row) else {
        return RenderedField::numeric_placeholder();
    };

    match compute_misery(row, misery_field) {
        Some(score) => {
            let palette = theme::misery_palette(MISERY_PALETTE_SIZE);
            let filled = score.score as usize;
            let mut spans = Vec::with_capacity(MISERY_PALETTE_SIZE as usize);
            for step in 0..MISERY_PALETTE_SIZE as usize {
                if step < filled {
                    spans.push(Span::styled("▮", Style::default().fg(palette[step])));
                } else {
                    spans.push(Span::styled("▯", Style::default().fg(theme::BORDER)));
                }
            }
            let tooltip = score.tooltip();
            RenderedField::numeric(Line::from(spans)).with_tooltip(tooltip)
        }
        // Without a unique-user count the score is meaningless; show the
        // raw misery value instead.
        None => match row.number(misery_field) {
            Some(value) => RenderedField::numeric(Line::from(Span::styled(
                format_float(value),
                Style::default().fg(theme::FG),
            ))),
            None => RenderedField::numeric_placeholder(),
        },
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Thousands-grouped integer display; fractional input is rounded.
pub fn format_grouped(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_float(value: f64) -> String {
    format!("{value:.4}")
}

/// Fraction → percent, two decimals with trailing zeros trimmed.
pub fn format_percentage(value: f64) -> String {
    let mut text = format!("{:.2}", value * 100.0);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    format!("{text}%")
}

/// Milliseconds → human duration with two fixed digits and a unit
/// abbreviation.
pub fn format_duration_ms(milliseconds: f64) -> String {
    let seconds = milliseconds / 1000.0;
    if seconds >= 3600.0 {
        format!("{:.2}h", seconds / 3600.0)
    } else if seconds >= 60.0 {
        format!("{:.2}m", seconds / 60.0)
    } else if seconds >= 1.0 {
        format!("{seconds:.2}s")
    } else {
        format!("{milliseconds:.2}ms")
    }
}

fn format_timestamp(value: &str) -> Option<String> {
    let timestamp = OffsetDateTime::parse(value, &Rfc3339).ok()?;
    let format = format_description!(
        "[month repr:short] [day padding:none], [year] [hour]:[minute]:[second]"
    );
    timestamp.format(&format).ok()
}
