//! Application state and its transitions.
//!
//! `AppState` is the single owner of the loaded collection, the visible
//! (filtered/sorted) rows, the open modal and its draft, and the transient
//! notifications. Transitions never touch the network: the ones that need a
//! request return a [`Command`] for the event loop to dispatch, and request
//! outcomes come back through [`AppState::apply_completion`].
//!
pub mod keymap;
pub mod update;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use ratatui::style::Color;
use tracing::{debug, info, warn};

use crate::api::{Command, Completion, Target};
use crate::error::ApiError;
use crate::model::{Draft, Role, Usuario};
use crate::search::apply_search;
use crate::validate::{FieldErrors, FormField, validate};

use keymap::Keymap;

/// Rows-per-page choices offered by the table.
pub const PAGE_SIZES: [usize; 3] = [5, 10, 25];
pub const DEFAULT_PAGE_SIZE: usize = 10;

const SUCCESS_LIFE: Duration = Duration::from_secs(3);
const ERROR_LIFE: Duration = Duration::from_secs(5);
const WARNING_LIFE: Duration = Duration::from_secs(3);

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Status of the data loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Email,
    Role,
    Active,
}

impl SortColumn {
    pub fn label(self) -> &'static str {
        match self {
            SortColumn::Id => "ID",
            SortColumn::Name => "Nombre",
            SortColumn::Email => "Email",
            SortColumn::Role => "Rol",
            SortColumn::Active => "Estado",
        }
    }

    /// Next column in the cycle; `None` after the last one (unsorted).
    fn next(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(SortColumn::Id),
            Some(SortColumn::Id) => Some(SortColumn::Name),
            Some(SortColumn::Name) => Some(SortColumn::Email),
            Some(SortColumn::Email) => Some(SortColumn::Role),
            Some(SortColumn::Role) => Some(SortColumn::Active),
            Some(SortColumn::Active) => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub ascending: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// A toast shown for `life` and then dropped.
#[derive(Clone, Debug)]
pub struct Notification {
    pub severity: Severity,
    pub detail: String,
    pub shown_at: Instant,
    pub life: Duration,
}

impl Notification {
    pub fn summary(&self) -> &'static str {
        match self.severity {
            Severity::Success => "Éxito",
            Severity::Warning => "Aviso",
            Severity::Error => "Error",
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.life
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: u64 },
}

impl FormMode {
    pub fn target(self) -> Target {
        match self {
            FormMode::Create => Target::New,
            FormMode::Edit { id } => Target::Record(id),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FormMode::Create => "Agregar Usuario",
            FormMode::Edit { .. } => "Editar Usuario",
        }
    }
}

/// Focusable elements of the form, in tab order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormFocus {
    Field(FormField),
    Save,
    Cancel,
}

impl FormFocus {
    const ORDER: [FormFocus; 6] = [
        FormFocus::Field(FormField::Name),
        FormFocus::Field(FormField::Email),
        FormFocus::Field(FormField::Role),
        FormFocus::Field(FormField::Active),
        FormFocus::Save,
        FormFocus::Cancel,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }
}

/// Create/edit form: the draft, its inline errors and the focused element.
#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    pub mode: FormMode,
    pub draft: Draft,
    pub errors: FieldErrors,
    pub focus: FormFocus,
}

impl FormState {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            draft: Draft::default(),
            errors: FieldErrors::default(),
            focus: FormFocus::Field(FormField::Name),
        }
    }

    pub fn edit(u: &Usuario) -> Self {
        Self {
            mode: FormMode::Edit { id: u.id },
            draft: Draft::from_usuario(u),
            errors: FieldErrors::default(),
            focus: FormFocus::Field(FormField::Name),
        }
    }

    /// Apply `f` to the draft on behalf of `field`; any error on that field is dropped right away.
    pub fn edit_field(&mut self, field: FormField, f: impl FnOnce(&mut Draft)) {
        f(&mut self.draft);
        self.errors.clear(field);
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            FormFocus::Field(FormField::Name) => self.edit_field(FormField::Name, |d| d.name.push(c)),
            FormFocus::Field(FormField::Email) => self.edit_field(FormField::Email, |d| d.email.push(c)),
            FormFocus::Field(field @ (FormField::Role | FormField::Active)) if c == ' ' => {
                self.cycle(field)
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormFocus::Field(FormField::Name) => self.edit_field(FormField::Name, |d| {
                d.name.pop();
            }),
            FormFocus::Field(FormField::Email) => self.edit_field(FormField::Email, |d| {
                d.email.pop();
            }),
            _ => {}
        }
    }

    /// Step a selector field: role cycles through the roles, active flips 0/1.
    pub fn cycle(&mut self, field: FormField) {
        match field {
            FormField::Role => self.edit_field(field, |d| {
                d.role = Role::cycle_from(&d.role).as_str().to_string()
            }),
            FormField::Active => self.edit_field(field, Draft::toggle_active),
            FormField::Name | FormField::Email => {}
        }
    }

    pub fn cycle_focused(&mut self) {
        if let FormFocus::Field(field) = self.focus {
            self.cycle(field);
        }
    }
}

/// Modal dialogs layered over the table.
#[derive(Clone, Debug)]
pub enum ModalState {
    Details { user: Usuario },
    Form(FormState),
    /// `selected`: 0 = accept, 1 = reject.
    ConfirmDelete { user: Usuario, selected: usize },
    Help { scroll: u16 },
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Theme {
    /// Catppuccin Mocha palette.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            success: Color::Rgb(0xa6, 0xe3, 0xa1),      // green
            warning: Color::Rgb(0xfa, 0xb3, 0x87),      // peach
            danger: Color::Rgb(0xf3, 0x8b, 0xa8),       // red
        }
    }

    fn slots(&mut self) -> [(&'static str, &mut Color); 13] {
        [
            ("text", &mut self.text),
            ("muted", &mut self.muted),
            ("title", &mut self.title),
            ("border", &mut self.border),
            ("header_bg", &mut self.header_bg),
            ("header_fg", &mut self.header_fg),
            ("status_bg", &mut self.status_bg),
            ("status_fg", &mut self.status_fg),
            ("highlight_fg", &mut self.highlight_fg),
            ("highlight_bg", &mut self.highlight_bg),
            ("success", &mut self.success),
            ("warning", &mut self.warning),
            ("danger", &mut self.danger),
        ]
    }

    /// Parse `key = color` lines. Unknown keys and bad colors keep the `mocha` value.
    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            let (key, val) = (key.trim(), val.trim());
            if let Some(color) = parse_color(val)
                && let Some((_, slot)) = theme.slots().into_iter().find(|(k, _)| *k == key)
            {
                *slot = color;
            }
        }
        theme
    }

    pub fn from_file(path: &str) -> Option<Self> {
        std::fs::read_to_string(path).ok().map(|c| Self::parse(&c))
    }

    pub fn to_conf(&self) -> String {
        use std::fmt::Write as _;
        let mut copy = *self;
        let mut buf = String::new();
        buf.push_str("# usuarios-admin theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");
        for (key, color) in copy.slots() {
            let _ = writeln!(&mut buf, "{} = {}", key, color_to_str(*color));
        }
        buf
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        std::fs::write(path, self.to_conf())
    }

    /// Load `path`, or write the default palette there and return it.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            warn!(path, error = %e, "Could not write default theme");
        }
        t
    }
}

/// Parse "#RRGGBB", "RRGGBB" or "reset".
fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "reset" {
        return Some(Color::Reset);
    }
    let hex = lower.strip_prefix('#').unwrap_or(&lower);
    if hex.len() != 6 {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(byte(0)?, byte(2)?, byte(4)?))
}

fn color_to_str(c: Color) -> String {
    match c {
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Reset => "reset".to_string(),
        Color::Black => "#000000".to_string(),
        Color::White => "#FFFFFF".to_string(),
        // Named colors are never produced by `mocha`; approximate as gray.
        _ => "#B3B3B3".to_string(),
    }
}

pub struct AppState {
    pub status: LoadStatus,
    /// Set once a load has succeeded; the blocking spinner only shows before that.
    pub loaded_once: bool,
    /// Generation of the most recent load; older completions are stale.
    pub load_generation: u64,
    pub users_all: Vec<Usuario>,
    pub users: Vec<Usuario>,
    pub selected_index: usize,
    pub page_size: usize,
    pub input_mode: InputMode,
    pub search_query: String,
    pub sort: Option<SortState>,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub notifications: Vec<Notification>,
    pub in_flight: HashSet<Target>,
    pub show_keybinds: bool,
    pub should_quit: bool,
}

impl AppState {
    /// Empty state with default theme and keys; `page_size` falls back to 10 unless it is one of [`PAGE_SIZES`].
    pub fn new(page_size: usize) -> Self {
        Self {
            status: LoadStatus::Loading,
            loaded_once: false,
            load_generation: 0,
            users_all: Vec::new(),
            users: Vec::new(),
            selected_index: 0,
            page_size: if PAGE_SIZES.contains(&page_size) { page_size } else { DEFAULT_PAGE_SIZE },
            input_mode: InputMode::Normal,
            search_query: String::new(),
            sort: None,
            theme: Theme::mocha(),
            keymap: Keymap::default(),
            modal: None,
            notifications: Vec::new(),
            in_flight: HashSet::new(),
            show_keybinds: false,
            should_quit: false,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    // ---- data loader ----------------------------------------------------

    /// Initial load when the view becomes active.
    pub fn start(&mut self) -> Command {
        self.load_started()
    }

    pub fn load_started(&mut self) -> Command {
        self.load_generation += 1;
        self.status = LoadStatus::Loading;
        debug!(generation = self.load_generation, "Load started");
        Command::Load {
            generation: self.load_generation,
        }
    }

    pub fn load_succeeded(&mut self, users: Vec<Usuario>) {
        info!(count = users.len(), "Usuarios loaded");
        self.users_all = users;
        self.status = LoadStatus::Ready;
        self.loaded_once = true;
        apply_search(self);
        self.clamp_selection();
    }

    /// The error screen replaces the whole view, so any open dialog is dropped and search typing ends.
    pub fn load_failed(&mut self, message: String) {
        warn!(error = %message, "Loading usuarios failed");
        self.status = LoadStatus::Failed(message);
        self.close_modal();
    }

    /// Blocking spinner: a load is running and nothing was ever loaded.
    pub fn is_initial_loading(&self) -> bool {
        self.status == LoadStatus::Loading && !self.loaded_once
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    // ---- completions ----------------------------------------------------

    /// Fold a finished request into the state. Returns the reload to issue after a successful mutation.
    pub fn apply_completion(&mut self, completion: Completion, now: Instant) -> Option<Command> {
        match completion {
            Completion::Loaded { generation, result } => {
                if generation != self.load_generation {
                    debug!(generation, latest = self.load_generation, "Ignoring stale load");
                    return None;
                }
                match result {
                    Ok(users) => self.load_succeeded(users),
                    Err(e) => self.load_failed(e.to_string()),
                }
                None
            }
            Completion::Created(result) => self.mutation_finished(Target::New, "creado", result, now),
            Completion::Updated { id, result } => {
                self.mutation_finished(Target::Record(id), "editado", result, now)
            }
            Completion::Deleted { id, result } => {
                self.mutation_finished(Target::Record(id), "eliminado", result, now)
            }
        }
    }

    fn mutation_finished(
        &mut self,
        target: Target,
        verb: &str,
        result: Result<(), ApiError>,
        now: Instant,
    ) -> Option<Command> {
        self.in_flight.remove(&target);
        match result {
            Ok(()) => {
                info!(?target, "Usuario {verb}");
                if matches!(&self.modal, Some(ModalState::Form(form)) if form.mode.target() == target) {
                    self.close_modal();
                }
                self.notify(Severity::Success, format!("Usuario {verb} correctamente"), now);
                Some(self.load_started())
            }
            Err(e) => {
                warn!(?target, error = %e, "Mutation failed");
                self.notify(Severity::Error, e.to_string(), now);
                None
            }
        }
    }

    // ---- notifications --------------------------------------------------

    pub fn notify(&mut self, severity: Severity, detail: impl Into<String>, now: Instant) {
        let life = match severity {
            Severity::Success => SUCCESS_LIFE,
            Severity::Warning => WARNING_LIFE,
            Severity::Error => ERROR_LIFE,
        };
        self.notifications.push(Notification {
            severity,
            detail: detail.into(),
            shown_at: now,
            life,
        });
    }

    pub fn expire_notifications(&mut self, now: Instant) {
        self.notifications.retain(|n| !n.is_expired(now));
    }

    // ---- CRUD controller ------------------------------------------------

    pub fn selected_user(&self) -> Option<&Usuario> {
        self.users.get(self.selected_index)
    }

    fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }

    /// Close whatever modal is open. An open draft is discarded.
    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn open_create(&mut self) {
        self.open_modal(ModalState::Form(FormState::create()));
    }

    pub fn open_edit(&mut self) {
        if let Some(u) = self.selected_user() {
            let form = FormState::edit(u);
            self.open_modal(ModalState::Form(form));
        }
    }

    pub fn open_details(&mut self) {
        if let Some(u) = self.selected_user().cloned() {
            self.open_modal(ModalState::Details { user: u });
        }
    }

    pub fn open_help(&mut self) {
        self.open_modal(ModalState::Help { scroll: 0 });
    }

    /// Ask for confirmation before deleting the selected row. Defaults to "No".
    pub fn request_delete(&mut self) {
        if let Some(u) = self.selected_user().cloned() {
            self.open_modal(ModalState::ConfirmDelete { user: u, selected: 1 });
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut FormState> {
        match &mut self.modal {
            Some(ModalState::Form(form)) => Some(form),
            _ => None,
        }
    }

    /// Refuse a second request for a target that already has one outstanding.
    fn claim(&mut self, target: Target, now: Instant) -> bool {
        if self.in_flight.insert(target) {
            return true;
        }
        warn!(?target, "Request already in progress");
        self.notify(Severity::Warning, "Ya hay una solicitud en curso para este usuario", now);
        false
    }

    /// Validate the open form and, when clean, issue its create/update request.
    ///
    /// The form stays open until the request completes; on failure the draft is
    /// left as typed so it can be corrected and resubmitted.
    pub fn submit_form(&mut self, now: Instant) -> Option<Command> {
        let form = self.form_mut()?;
        let errors = validate(&form.draft);
        if !errors.is_empty() {
            debug!(fields = ?errors.fields().collect::<Vec<_>>(), "Form has validation errors");
            form.errors = errors;
            return None;
        }
        form.errors = FieldErrors::default();
        let mode = form.mode;
        let payload = form.draft.to_payload();
        if !self.claim(mode.target(), now) {
            return None;
        }
        Some(match mode {
            FormMode::Create => Command::Create(payload),
            FormMode::Edit { id } => Command::Update { id, payload },
        })
    }

    /// Accept the delete confirmation.
    pub fn confirm_delete(&mut self, now: Instant) -> Option<Command> {
        let Some(ModalState::ConfirmDelete { user, .. }) = &self.modal else {
            return None;
        };
        let id = user.id;
        self.close_modal();
        if !self.claim(Target::Record(id), now) {
            return None;
        }
        Some(Command::Delete { id })
    }

    /// Reject the delete confirmation: nothing else changes.
    pub fn reject_delete(&mut self) {
        if matches!(self.modal, Some(ModalState::ConfirmDelete { .. })) {
            self.close_modal();
        }
    }

    // ---- table navigation -----------------------------------------------

    fn clamp_selection(&mut self) {
        self.selected_index = self.selected_index.min(self.users.len().saturating_sub(1));
    }

    pub fn page_count(&self) -> usize {
        self.users.len().div_ceil(self.page_size).max(1)
    }

    pub fn current_page(&self) -> usize {
        self.selected_index / self.page_size
    }

    /// Half-open row range of the current page.
    pub fn page_bounds(&self) -> (usize, usize) {
        let start = self.current_page() * self.page_size;
        let end = (start + self.page_size).min(self.users.len());
        (start.min(end), end)
    }

    pub fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected_index + 1 < self.users.len() {
            self.selected_index += 1;
        }
    }

    pub fn prev_page(&mut self) {
        let page = self.current_page().saturating_sub(1);
        self.selected_index = page * self.page_size;
    }

    pub fn next_page(&mut self) {
        let page = self.current_page() + 1;
        if page < self.page_count() {
            self.selected_index = (page * self.page_size).min(self.users.len().saturating_sub(1));
        }
    }

    pub fn cycle_page_size(&mut self) {
        let pos = PAGE_SIZES.iter().position(|s| *s == self.page_size).unwrap_or(0);
        self.page_size = PAGE_SIZES[(pos + 1) % PAGE_SIZES.len()];
    }

    pub fn cycle_sort_column(&mut self) {
        self.sort = SortColumn::next(self.sort.map(|s| s.column)).map(|column| SortState {
            column,
            ascending: true,
        });
        apply_search(self);
    }

    pub fn reverse_sort(&mut self) {
        if let Some(sort) = &mut self.sort {
            sort.ascending = !sort.ascending;
            apply_search(self);
        }
    }

    // ---- search ---------------------------------------------------------

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn search_push(&mut self, c: char) {
        self.search_query.push(c);
        apply_search(self);
    }

    pub fn search_pop(&mut self) {
        self.search_query.pop();
        apply_search(self);
    }

    pub fn search_commit(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn search_cancel(&mut self) {
        self.search_query.clear();
        apply_search(self);
        self.input_mode = InputMode::Normal;
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
