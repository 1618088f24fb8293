//! Usuario records as served by the API, and the editable draft behind the form.
//!
use serde::{Deserialize, Serialize};

/// One user as returned by `GET /api/usuarios`.
///
/// `role` stays textual so an unexpected server value never breaks a load;
/// the form validator is what restricts it to [`Role`].
///
/// The legacy field names are accepted on decode only. Writes always use
/// [`UserPayload`]'s English keys, and a legacy role such as `cliente` must be
/// changed to a [`Role`] before an edit validates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usuario {
    #[serde(alias = "idusuario")]
    pub id: u64,
    #[serde(alias = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(alias = "rol")]
    pub role: String,
    #[serde(alias = "activo")]
    pub active: i64,
    #[serde(alias = "fechacreacion", default)]
    pub created_at: Option<String>,
}

impl Usuario {
    pub fn is_active(&self) -> bool {
        self.active == 1
    }

    /// Status tag shown in the table and the details modal.
    pub fn status_label(&self) -> &'static str {
        if self.is_active() { "Activo" } else { "Inactivo" }
    }

    /// Creation timestamp as `DD/MM/YYYY, HH:MM:SS`.
    ///
    /// Only the `YYYY-MM-DD[T| ]HH:MM[:SS]` prefix is read, with no time-zone
    /// shift. Values of any other shape are shown as sent; a missing date is blank.
    pub fn created_label(&self) -> String {
        let Some(raw) = self.created_at.as_deref() else {
            return String::new();
        };
        format_timestamp(raw).unwrap_or_else(|| raw.to_string())
    }

    /// Role with its first letter upper-cased, as shown in the details modal.
    pub fn display_role(&self) -> String {
        let mut chars = self.role.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

fn format_timestamp(raw: &str) -> Option<String> {
    let digits =
        |s: &str, n: usize| (s.len() == n && s.bytes().all(|b| b.is_ascii_digit())).then_some(());
    let raw = raw.trim();
    let date = raw.get(..10)?;
    let mut parts = date.split('-');
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    digits(y, 4)?;
    digits(m, 2)?;
    digits(d, 2)?;

    let rest = &raw[10..];
    let time = match rest.chars().next() {
        None => return Some(format!("{d}/{m}/{y}")),
        Some('T' | ' ') => &rest[1..],
        Some(_) => return None,
    };
    let hh = time.get(..2)?;
    let mm = time.get(3..5)?;
    digits(hh, 2)?;
    digits(mm, 2)?;
    (time.get(2..3)? == ":").then_some(())?;
    let ss = match time.get(5..8) {
        Some(s) if s.starts_with(':') && digits(&s[1..], 2).is_some() => &s[1..],
        _ => "00",
    };
    Some(format!("{d}/{m}/{y}, {hh}:{mm}:{ss}"))
}

/// Roles accepted by the API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Customer, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Role shown after `current` when cycling the selector; unknown values restart at the first role.
    pub fn cycle_from(current: &str) -> Self {
        match Self::parse(current) {
            Some(Role::Customer) => Role::Admin,
            Some(Role::Admin) | None => Role::Customer,
        }
    }
}

/// In-progress copy of the editable fields, held as typed text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            role: Role::Customer.as_str().to_string(),
            active: "1".to_string(),
        }
    }
}

impl Draft {
    pub fn from_usuario(u: &Usuario) -> Self {
        Self {
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role.clone(),
            active: u.active.to_string(),
        }
    }

    /// `active` as a number, following text-to-number conversion: blank is 0,
    /// anything unparsable is `None`.
    pub fn active_number(&self) -> Option<f64> {
        let t = self.active.trim();
        if t.is_empty() {
            return Some(0.0);
        }
        t.parse::<f64>().ok().filter(|n| !n.is_nan())
    }

    pub fn toggle_active(&mut self) {
        self.active = if self.active_number() == Some(1.0) { "0" } else { "1" }.to_string();
    }

    /// Body for create/update. Only meaningful once the draft has validated.
    pub fn to_payload(&self) -> UserPayload {
        UserPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role.clone(),
            active: self.active_number().map(|n| n as i64).unwrap_or(0),
        }
    }
}

/// JSON body sent on `POST` and `PUT`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: i64,
}
