//! Shared UI components: status bar, toasts, loading/error screens, help and keybinds.
//!
use std::collections::{BTreeMap, BTreeSet};

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, Keymap};
use crate::app::{AppState, InputMode, Severity};

const TOAST_WIDTH: u16 = 44;

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Bottom status bar: mode, counts, requests in flight.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "BUSCAR",
        InputMode::Modal => "MODAL",
    };
    let pending = if app.in_flight.is_empty() {
        String::new()
    } else {
        format!("  pendientes:{}", app.in_flight.len())
    };
    let reloading = if app.status == crate::app::LoadStatus::Loading { "  recargando…" } else { "" };
    let msg = format!(
        "modo: {mode}  usuarios:{}  visibles:{}  filas/página:{}{pending}{reloading}",
        app.users_all.len(),
        app.users.len(),
        app.page_size,
    );
    let p = Paragraph::new(msg).style(Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg));
    f.render_widget(p, area);
}

/// Blocking spinner shown only for the first load.
pub fn render_loading(f: &mut Frame, area: Rect, app: &AppState) {
    let rect = centered_rect(40, 5, area);
    let p = Paragraph::new(vec![Line::raw(""), Line::raw("Cargando Usuarios...")])
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(app.theme.border)));
    f.render_widget(p, rect);
}

/// Full-screen load error; replaces the table and its actions.
pub fn render_load_error(f: &mut Frame, area: Rect, app: &AppState, message: &str) {
    let width = 70u16.min(area.width.saturating_sub(4)).max(30);
    let rect = centered_rect(width, 8, area);
    let lines = vec![
        Line::from(Span::styled(
            "Error al cargar los Usuarios",
            Style::default().fg(app.theme.danger).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::from(Span::styled("r: reintentar · q: salir", Style::default().fg(app.theme.muted))),
    ];
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(app.theme.danger)));
    f.render_widget(p, rect);
}

/// Stack of transient notifications in the top-right corner, newest last.
pub fn render_toasts(f: &mut Frame, area: Rect, app: &AppState) {
    let width = TOAST_WIDTH.min(area.width);
    let mut y = area.y.saturating_add(1);
    for n in &app.notifications {
        let color = match n.severity {
            Severity::Success => app.theme.success,
            Severity::Warning => app.theme.warning,
            Severity::Error => app.theme.danger,
        };
        let height = toast_height(&n.detail, width);
        if y.saturating_add(height) > area.y.saturating_add(area.height) {
            break;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(width.saturating_add(1)),
            y,
            width,
            height,
        };
        let p = Paragraph::new(n.detail.clone())
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(app.theme.text))
            .block(
                Block::default()
                    .title(Span::styled(n.summary(), Style::default().fg(color).add_modifier(Modifier::BOLD)))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
        y = y.saturating_add(height);
    }
}

/// Bordered height needed to wrap `detail` into a toast `width` columns wide.
fn toast_height(detail: &str, width: u16) -> u16 {
    let inner_w = usize::from(width.saturating_sub(2).max(1));
    let lines = detail.chars().count().div_ceil(inner_w).max(1);
    u16::try_from(lines).unwrap_or(u16::MAX).saturating_add(2)
}

fn action_label(action: KeyAction) -> Option<&'static str> {
    Some(match action {
        KeyAction::Quit => "Salir",
        KeyAction::OpenHelp => "Ayuda",
        KeyAction::StartSearch => "Buscar",
        KeyAction::NewUser => "Nuevo usuario",
        KeyAction::EditSelection => "Editar",
        KeyAction::ViewDetails => "Ver detalles",
        KeyAction::DeleteSelection => "Eliminar",
        KeyAction::Reload => "Recargar",
        KeyAction::CycleSort => "Ordenar por columna",
        KeyAction::ReverseSort => "Invertir orden",
        KeyAction::CyclePageSize => "Filas por página",
        KeyAction::ToggleKeybindsPane => "Panel de teclas",
        KeyAction::MoveUp => "Subir",
        KeyAction::MoveDown => "Bajar",
        KeyAction::PrevPage => "Página anterior",
        KeyAction::NextPage => "Página siguiente",
        KeyAction::Ignore => return None,
    })
}

/// Group the current keymap as label → keys, sorted for display.
pub fn keybind_rows(keymap: &Keymap) -> BTreeMap<&'static str, BTreeSet<String>> {
    let mut rows: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
    for ((mods, code), action) in keymap.all_bindings() {
        if let Some(label) = action_label(action) {
            rows.entry(label).or_default().insert(Keymap::format_key(mods, code));
        }
    }
    rows
}

/// Right-side panel listing every bound action.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Teclas")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let rows = keybind_rows(&app.keymap);
    let col1_w = rows.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let lines: Vec<Line> = rows
        .iter()
        .map(|(label, keys)| {
            let joined = keys.iter().cloned().collect::<Vec<_>>().join(", ");
            Line::from(vec![
                Span::raw(format!("{:>width$} │ ", label, width = col1_w)),
                Span::styled(joined, Style::default().add_modifier(Modifier::ITALIC)),
            ])
        })
        .collect();

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Help modal with the main keys of every screen.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 72u16.min(area.width.saturating_sub(4)).max(40);
    let height = 22u16.min(area.height.saturating_sub(4)).max(10);
    let rect = centered_rect(width, height, area);

    let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::ITALIC));
    let heading = |t: &'static str| Line::from(Span::styled(t, Style::default().add_modifier(Modifier::BOLD)));
    let lines: Vec<Line> = vec![
        heading("Tabla"),
        Line::from(vec![Span::raw("Navegar: "), key("↑ ↓ / j k"), Span::raw("  páginas: "), key("← → / h l / PgUp PgDn")]),
        Line::from(vec![Span::raw("Buscar (nombre, email, rol): "), key("/"), Span::raw(" escribir; Enter fija; Esc limpia")]),
        Line::from(vec![Span::raw("Ordenar: "), key("s"), Span::raw(" columna, "), key("S"), Span::raw(" invertir")]),
        Line::from(vec![Span::raw("Filas por página (5/10/25): "), key("p")]),
        Line::from(vec![Span::raw("Recargar: "), key("r"), Span::raw("  panel de teclas: "), key("Shift+K")]),
        Line::raw(""),
        heading("Acciones"),
        Line::from(vec![Span::raw("Nuevo: "), key("n"), Span::raw("  editar: "), key("e"), Span::raw("  ver: "), key("Enter / v")]),
        Line::from(vec![Span::raw("Eliminar (con confirmación): "), key("Supr / d")]),
        Line::raw(""),
        heading("Formulario"),
        Line::from(vec![Span::raw("Campo siguiente/anterior: "), key("Tab / Shift+Tab")]),
        Line::from(vec![Span::raw("Rol y estado: "), key("← → / Espacio")]),
        Line::from(vec![Span::raw("Guardar: "), key("Enter / Ctrl+S"), Span::raw("  cancelar: "), key("Esc")]),
        Line::raw(""),
        Line::from(vec![Span::raw("Salir: "), key("q"), Span::raw("  cerrar ayuda: "), key("Esc / Enter")]),
    ];

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Ayuda")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_clamped_to_area() {
        let area = Rect { x: 0, y: 0, width: 20, height: 10 };
        let r = centered_rect(40, 4, area);
        assert_eq!(r, Rect { x: 0, y: 3, width: 20, height: 4 });
    }

    #[test]
    fn toast_height_saturates_on_huge_messages() {
        assert_eq!(toast_height("", TOAST_WIDTH), 3);
        assert_eq!(toast_height(&"x".repeat(43), TOAST_WIDTH), 4);
        let huge = "x".repeat(42 * 70_000);
        assert_eq!(toast_height(&huge, TOAST_WIDTH), u16::MAX);
    }

    #[test]
    fn huge_toast_renders_without_panicking() {
        use ratatui::{Terminal, backend::TestBackend};
        let mut app = AppState::new(10);
        app.notify(Severity::Error, "e".repeat(42 * 70_000), std::time::Instant::now());
        app.notify(Severity::Success, "ok", std::time::Instant::now());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render_toasts(f, f.area(), &app)).unwrap();
    }

    #[test]
    fn keybind_rows_group_keys_by_action() {
        let rows = keybind_rows(&Keymap::default());
        let delete = rows.get("Eliminar").unwrap();
        assert!(delete.contains("Delete"));
        assert!(delete.contains("d"));
        assert!(!rows.values().any(|keys| keys.contains("Esc")));
    }
}
