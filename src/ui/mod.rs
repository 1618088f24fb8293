pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let area = f.area();

    if app.is_initial_loading() {
        components::render_loading(f, area, app);
    } else if let Some(message) = app.load_error().map(str::to_string) {
        components::render_load_error(f, area, app, &message);
    } else {
        render_main(f, app);
    }

    if let Some(state) = app.modal.clone() {
        match &state {
            ModalState::Details { user } => users::render_details_modal(f, area, app, user),
            ModalState::Form(form) => users::render_form_modal(f, area, app, form),
            ModalState::ConfirmDelete { user, selected } => {
                users::render_delete_confirm(f, area, app, user, *selected)
            }
            ModalState::Help { scroll } => components::render_help_modal(f, area, app, *scroll),
        }
    }

    components::render_toasts(f, area, app);
}

fn render_main(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let prompt = match app.input_mode {
        InputMode::Search => format!("  Buscar: {}_", app.search_query),
        _ if !app.search_query.is_empty() => format!("  Buscar: {}", app.search_query),
        _ => String::new(),
    };
    let p = Paragraph::new(format!(
        "Lista de Usuarios  {}/{}{prompt}  · n: nuevo; e: editar; Enter: ver; Supr: eliminar; /: buscar; ?: ayuda; q: salir",
        app.users.len(),
        app.users_all.len(),
    ))
    .block(
        Block::default()
            .title("usuarios-admin")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    if app.show_keybinds {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(root[1]);
        users::render_users_table(f, body[0], app);
        components::render_keybinds_panel(f, body[1], app);
    } else {
        users::render_users_table(f, root[1], app);
    }

    users::render_pagination(f, root[2], app);
    components::render_status_bar(f, root[3], app);
}
