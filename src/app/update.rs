use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, info};

use crate::api::{Command, Completion, Dispatcher};
use crate::app::keymap::KeyAction;
use crate::app::{AppState, FormFocus, InputMode, LoadStatus, ModalState};
use crate::ui;

const TICK: Duration = Duration::from_millis(100);

/// Drive the UI: draw, fold in finished requests, handle one key, repeat.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: AppState,
    dispatcher: &Dispatcher,
    completions: &Receiver<Completion>,
) -> Result<()> {
    dispatcher.dispatch(app.start());

    while !app.should_quit {
        let now = Instant::now();
        app.expire_notifications(now);
        terminal.draw(|f| ui::render(f, &mut app))?;

        while let Ok(done) = completions.try_recv() {
            if let Some(cmd) = app.apply_completion(done, Instant::now()) {
                dispatcher.dispatch(cmd);
            }
        }

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(cmd) = handle_key(&mut app, key, Instant::now())
        {
            dispatcher.dispatch(cmd);
        }
    }

    info!("Leaving event loop");
    Ok(())
}

/// Apply one key press to the state; returns the request it triggers, if any.
pub fn handle_key(app: &mut AppState, key: KeyEvent, now: Instant) -> Option<Command> {
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Search => {
            handle_search_key(app, key.code);
            None
        }
        InputMode::Modal => handle_modal_key(app, key, now),
    }
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) -> Option<Command> {
    let action = app.keymap.resolve(&key)?;
    debug!(?action, "Key action");

    // While loading for the first time or showing a load error, the table and
    // its actions are hidden: only quitting, help and reloading make sense.
    let table_visible = !app.is_initial_loading() && !matches!(app.status, LoadStatus::Failed(_));
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::OpenHelp => app.open_help(),
        KeyAction::Reload => {
            if app.status != LoadStatus::Loading {
                return Some(app.load_started());
            }
        }
        _ if !table_visible => {}
        KeyAction::StartSearch => app.start_search(),
        KeyAction::NewUser => app.open_create(),
        KeyAction::EditSelection => app.open_edit(),
        KeyAction::ViewDetails => app.open_details(),
        KeyAction::DeleteSelection => app.request_delete(),
        KeyAction::CycleSort => app.cycle_sort_column(),
        KeyAction::ReverseSort => app.reverse_sort(),
        KeyAction::CyclePageSize => app.cycle_page_size(),
        KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
        KeyAction::MoveUp => app.move_up(),
        KeyAction::MoveDown => app.move_down(),
        KeyAction::PrevPage => app.prev_page(),
        KeyAction::NextPage => app.next_page(),
        KeyAction::Ignore => {}
    }
    None
}

fn handle_search_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Enter => app.search_commit(),
        KeyCode::Esc => app.search_cancel(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(c) => app.search_push(c),
        _ => {}
    }
}

fn handle_modal_key(app: &mut AppState, key: KeyEvent, now: Instant) -> Option<Command> {
    match &mut app.modal {
        Some(ModalState::Details { .. }) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q')) {
                app.close_modal();
            }
            None
        }
        Some(ModalState::Help { scroll }) => {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') => app.close_modal(),
                KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
                _ => {}
            }
            None
        }
        Some(ModalState::ConfirmDelete { selected, .. }) => match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Char('l') => {
                *selected = 1 - *selected;
                None
            }
            KeyCode::Enter if *selected == 0 => app.confirm_delete(now),
            KeyCode::Char('y') | KeyCode::Char('s') => app.confirm_delete(now),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') => {
                app.reject_delete();
                None
            }
            _ => None,
        },
        Some(ModalState::Form(form)) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
                return app.submit_form(now);
            }
            match key.code {
                KeyCode::Esc => app.close_modal(),
                KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
                KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
                KeyCode::Left | KeyCode::Right => form.cycle_focused(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Enter if form.focus == FormFocus::Cancel => app.close_modal(),
                KeyCode::Enter => return app.submit_form(now),
                KeyCode::Char(c) => form.push_char(c),
                _ => {}
            }
            None
        }
        None => {
            // Modal mode without a modal: recover to the table.
            app.input_mode = InputMode::Normal;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{UserPayload, Usuario};
    use crate::validate::FormField;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn ready_app(users: Vec<Usuario>) -> AppState {
        let mut app = AppState::new(10);
        let Command::Load { generation } = app.start() else { unreachable!() };
        app.apply_completion(Completion::Loaded { generation, result: Ok(users) }, Instant::now());
        app
    }

    fn ana() -> Usuario {
        Usuario {
            id: 1,
            name: "Ana".into(),
            email: "ana@x.com".into(),
            role: "admin".into(),
            active: 1,
            created_at: Some("2024-01-01".into()),
        }
    }

    fn type_keys(app: &mut AppState, s: &str) {
        for c in s.chars() {
            assert!(handle_key(app, press(KeyCode::Char(c)), Instant::now()).is_none());
        }
    }

    #[test]
    fn typing_into_the_form_and_saving_issues_create() {
        let mut app = ready_app(vec![]);
        handle_key(&mut app, press(KeyCode::Char('n')), Instant::now());
        assert_eq!(app.input_mode, InputMode::Modal);
        type_keys(&mut app, "Bob");
        handle_key(&mut app, press(KeyCode::Tab), Instant::now());
        type_keys(&mut app, "bob@x.com");
        let cmd = handle_key(&mut app, press(KeyCode::Enter), Instant::now());
        assert_eq!(
            cmd,
            Some(Command::Create(UserPayload {
                name: "Bob".into(),
                email: "bob@x.com".into(),
                role: "customer".into(),
                active: 1
            }))
        );
    }

    #[test]
    fn selectors_cycle_with_arrows_and_space() {
        let mut app = ready_app(vec![]);
        app.open_create();
        for _ in 0..2 {
            handle_key(&mut app, press(KeyCode::Tab), Instant::now());
        }
        handle_key(&mut app, press(KeyCode::Right), Instant::now());
        handle_key(&mut app, press(KeyCode::Tab), Instant::now());
        handle_key(&mut app, press(KeyCode::Char(' ')), Instant::now());
        let form = app.form_mut().unwrap();
        assert_eq!(form.focus, FormFocus::Field(FormField::Active));
        assert_eq!(form.draft.role, "admin");
        assert_eq!(form.draft.active, "0");
    }

    #[test]
    fn delete_needs_explicit_accept() {
        let mut app = ready_app(vec![ana()]);
        handle_key(&mut app, press(KeyCode::Delete), Instant::now());
        // default focus is "No"
        assert!(handle_key(&mut app, press(KeyCode::Enter), Instant::now()).is_none());
        assert!(app.modal.is_none());

        handle_key(&mut app, press(KeyCode::Delete), Instant::now());
        handle_key(&mut app, press(KeyCode::Left), Instant::now());
        let cmd = handle_key(&mut app, press(KeyCode::Enter), Instant::now());
        assert_eq!(cmd, Some(Command::Delete { id: 1 }));
    }

    #[test]
    fn search_filters_live_and_esc_clears() {
        let mut bob = ana();
        bob.id = 2;
        bob.name = "Bob".into();
        bob.email = "bob@y.org".into();
        let mut app = ready_app(vec![ana(), bob]);
        handle_key(&mut app, press(KeyCode::Char('/')), Instant::now());
        type_keys(&mut app, "y.org");
        assert_eq!(app.users.len(), 1);
        handle_key(&mut app, press(KeyCode::Esc), Instant::now());
        assert_eq!(app.users.len(), 2);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn load_error_hides_actions_but_allows_reload() {
        let mut app = AppState::new(10);
        app.start();
        app.apply_completion(
            Completion::Loaded { generation: 1, result: Err(crate::error::ApiError::Http { status: 503 }) },
            Instant::now(),
        );
        assert!(handle_key(&mut app, press(KeyCode::Char('n')), Instant::now()).is_none());
        assert!(app.modal.is_none());
        let cmd = handle_key(&mut app, press(KeyCode::Char('r')), Instant::now());
        assert_eq!(cmd, Some(Command::Load { generation: 2 }));
        assert_eq!(app.status, LoadStatus::Loading);
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = ready_app(vec![]);
        handle_key(&mut app, press(KeyCode::Char('q')), Instant::now());
        assert!(app.should_quit);
    }
}
