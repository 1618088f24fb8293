//! Usuarios table, pagination footer, and the details/form/confirm modals.
//!
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, FormFocus, FormState, PAGE_SIZES, SortColumn, Theme};
use crate::model::{Role, Usuario};
use crate::validate::FormField;

/// Colored "Activo"/"Inactivo" tag.
pub fn status_tag(u: &Usuario, theme: &Theme) -> Span<'static> {
    let color = if u.is_active() { theme.success } else { theme.danger };
    Span::styled(u.status_label(), Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn header_label(app: &AppState, column: SortColumn) -> String {
    match app.sort {
        Some(s) if s.column == column => {
            format!("{} {}", column.label(), if s.ascending { "▲" } else { "▼" })
        }
        _ => column.label().to_string(),
    }
}

/// Render the current page of visible rows.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Usuarios")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    if app.users.is_empty() {
        let p = Paragraph::new("No se encontraron usuarios.")
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let (start, end) = app.page_bounds();
    let rows = app.users[start..end].iter().enumerate().map(|(i, u)| {
        let style = if start + i == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.name.clone()),
            Cell::from(u.email.clone()),
            Cell::from(u.role.clone()),
            Cell::from(status_tag(u, &app.theme)),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Percentage(10),
        Constraint::Percentage(30),
        Constraint::Percentage(30),
        Constraint::Percentage(15),
        Constraint::Percentage(15),
    ];
    let header = Row::new(
        [SortColumn::Id, SortColumn::Name, SortColumn::Email, SortColumn::Role, SortColumn::Active]
            .map(|c| header_label(app, c)),
    )
    .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}

/// One-line footer: page position, page-size choices and sort.
pub fn render_pagination(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::raw(format!(
        " Página {}/{}  ·  filas por página: ",
        app.current_page() + 1,
        app.page_count()
    ))];
    for size in PAGE_SIZES {
        let label = format!("{size} ");
        if size == app.page_size {
            spans.push(Span::styled(
                format!("[{}] ", size),
                Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(label));
        }
    }
    let sort = match app.sort {
        Some(s) => format!(" ·  orden: {} {}", s.column.label(), if s.ascending { "asc" } else { "desc" }),
        None => String::new(),
    };
    spans.push(Span::raw(sort));
    let p = Paragraph::new(Line::from(spans)).style(Style::default().fg(app.theme.muted));
    f.render_widget(p, area);
}

fn modal_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
}

/// Read-only details of one record.
pub fn render_details_modal(f: &mut Frame, area: Rect, app: &AppState, user: &Usuario) {
    let rect = crate::ui::components::centered_rect(56, 11, area);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let field = |label: &'static str, value: Span<'static>| {
        Line::from(vec![Span::styled(format!("{label}: "), bold), value])
    };
    let lines = vec![
        field("ID", Span::raw(user.id.to_string())),
        field("Nombre", Span::raw(user.name.clone())),
        field("Email", Span::raw(user.email.clone())),
        field("Rol", Span::raw(user.display_role())),
        field("Estado", status_tag(user, &app.theme)),
        field("Fecha creación", Span::raw(user.created_label())),
        Line::raw(""),
        Line::from(Span::styled("Esc: Cerrar", Style::default().fg(app.theme.muted))),
    ];
    let p = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.text))
        .block(modal_block("Detalles del Usuario", &app.theme));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

fn choice(label: &str, on: bool) -> String {
    if on { format!("(•) {label}") } else { format!("( ) {label}") }
}

/// Create/edit form with inline per-field errors.
pub fn render_form_modal(f: &mut Frame, area: Rect, app: &AppState, form: &FormState) {
    let rect = crate::ui::components::centered_rect(60, 18, area);
    let theme = &app.theme;
    let focused = Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD);
    let normal = Style::default().fg(theme.text);

    let mut lines: Vec<Line> = Vec::new();
    for field in FormField::ALL {
        let has_focus = form.focus == FormFocus::Field(field);
        let marker = if has_focus { "▶ " } else { "  " };
        let value = match field {
            FormField::Name => format!("{}{}", form.draft.name, if has_focus { "_" } else { "" }),
            FormField::Email => format!("{}{}", form.draft.email, if has_focus { "_" } else { "" }),
            FormField::Role => Role::ALL
                .map(|r| choice(r.as_str(), form.draft.role == r.as_str()))
                .join("  "),
            FormField::Active => {
                let n = form.draft.active_number();
                format!("{}  {}", choice("Activo", n == Some(1.0)), choice("Inactivo", n == Some(0.0)))
            }
        };
        lines.push(Line::from(Span::styled(field.label(), Style::default().fg(theme.title))));
        let value_style = if form.errors.contains(field) {
            Style::default().fg(theme.danger)
        } else if has_focus {
            focused
        } else {
            normal
        };
        lines.push(Line::from(vec![Span::raw(marker), Span::styled(value, value_style)]));
        if let Some(msg) = form.errors.get(field) {
            lines.push(Line::from(Span::styled(format!("  {msg}"), Style::default().fg(theme.danger))));
        }
    }

    lines.push(Line::raw(""));
    let button = |label: &'static str, focus: FormFocus| {
        Span::styled(format!("[ {label} ]"), if form.focus == focus { focused } else { normal })
    };
    lines.push(Line::from(vec![
        button("Cancelar", FormFocus::Cancel),
        Span::raw("  "),
        button("Guardar", FormFocus::Save),
    ]));
    lines.push(Line::from(Span::styled(
        "Tab: siguiente · ←/→/Espacio: cambiar · Enter: guardar · Esc: cancelar",
        Style::default().fg(theme.muted),
    )));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(modal_block(form.mode.title(), theme));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Blocking confirmation naming the record to delete. `selected`: 0 accept, 1 reject.
pub fn render_delete_confirm(f: &mut Frame, area: Rect, app: &AppState, user: &Usuario, selected: usize) {
    let rect = crate::ui::components::centered_rect(60, 8, area);
    let focused = Style::default()
        .fg(app.theme.highlight_fg)
        .add_modifier(Modifier::BOLD | Modifier::REVERSED);
    let yes_style = if selected == 0 { focused.fg(app.theme.danger) } else { Style::default() };
    let no_style = if selected == 1 { focused } else { Style::default() };
    let lines = vec![
        Line::raw(format!(
            "⚠ ¿Estás seguro de que deseas eliminar al usuario \"{}\"?",
            user.name
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled(" Sí, eliminar ", yes_style),
            Span::raw("    "),
            Span::styled(" No, cancelar ", no_style),
        ]),
    ];
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(modal_block("Confirmar Eliminación", &app.theme));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
