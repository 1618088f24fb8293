//! Client-side validation of a [`Draft`] before it is sent to the API.
//!
//! Every rule runs on every call; the result maps each failing field to the
//! message shown under its input.
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Draft, Role};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub const NAME_REQUIRED: &str = "El nombre es obligatorio.";
pub const EMAIL_INVALID: &str = "El email es obligatorio y debe ser válido.";
pub const ROLE_INVALID: &str = "El rol debe ser \"customer\" o \"admin\".";
pub const ACTIVE_INVALID: &str = "El estado debe ser 0 (Inactivo) o 1 (Activo).";

/// Editable fields of the form, in display order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Email,
    Role,
    Active,
}

impl FormField {
    pub const ALL: [FormField; 4] = [FormField::Name, FormField::Email, FormField::Role, FormField::Active];

    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Email => "email",
            FormField::Role => "role",
            FormField::Active => "active",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Nombre *",
            FormField::Email => "Email *",
            FormField::Role => "Rol *",
            FormField::Active => "Estado *",
        }
    }

    /// Whether the field takes typed characters (as opposed to a selector).
    pub fn is_text(self) -> bool {
        matches!(self, FormField::Name | FormField::Email)
    }
}

/// Field → message mapping. Empty means the draft can be submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<FormField, &'static str>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FormField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn clear(&mut self, field: FormField) {
        self.0.remove(&field);
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    fn insert(&mut self, field: FormField, msg: &'static str) {
        self.0.insert(field, msg);
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate(draft: &Draft) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if draft.name.trim().is_empty() {
        errors.insert(FormField::Name, NAME_REQUIRED);
    }
    if draft.email.is_empty() || !is_valid_email(&draft.email) {
        errors.insert(FormField::Email, EMAIL_INVALID);
    }
    if Role::parse(&draft.role).is_none() {
        errors.insert(FormField::Role, ROLE_INVALID);
    }
    if !matches!(draft.active_number(), Some(n) if n == 0.0 || n == 1.0) {
        errors.insert(FormField::Active, ACTIVE_INVALID);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str, role: &str, active: &str) -> Draft {
        Draft { name: name.into(), email: email.into(), role: role.into(), active: active.into() }
    }

    #[test]
    fn valid_draft_has_no_errors() {
        assert!(validate(&draft("Bob", "bob@x.com", "customer", "1")).is_empty());
        assert!(validate(&draft("Ana", "ana@x.com", "admin", "0")).is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        for name in ["", " ", "\t\n  "] {
            let errs = validate(&draft(name, "bob@x.com", "customer", "1"));
            assert_eq!(errs.get(FormField::Name), Some(NAME_REQUIRED));
            assert_eq!(errs.len(), 1);
        }
    }

    #[test]
    fn email_must_look_like_local_at_domain_tld() {
        for bad in ["", "bad", "a@b", "@b.c", "a@.c", "a b@c.d", "a@b c.d", "a@@b.c", "a@b."] {
            let errs = validate(&draft("Bob", bad, "customer", "1"));
            assert!(errs.contains(FormField::Email), "{bad:?} should fail");
        }
        for good in ["a@b.c", "bob.smith@mail.example.org", "x+y@d.io"] {
            assert!(!validate(&draft("Bob", good, "customer", "1")).contains(FormField::Email), "{good:?}");
        }
    }

    #[test]
    fn role_must_be_exactly_customer_or_admin() {
        for bad in ["", "Admin", "cliente", "root", " admin"] {
            assert!(validate(&draft("Bob", "b@x.co", bad, "1")).contains(FormField::Role), "{bad:?}");
        }
    }

    #[test]
    fn active_outside_zero_one_is_rejected_with_one_message() {
        for bad in ["2", "-1", "0.5", "yes", "true"] {
            let errs = validate(&draft("Bob", "b@x.co", "admin", bad));
            assert_eq!(errs.get(FormField::Active), Some(ACTIVE_INVALID), "{bad:?}");
        }
        assert!(!validate(&draft("Bob", "b@x.co", "admin", "1.0")).contains(FormField::Active));
    }

    #[test]
    fn all_rules_run_without_short_circuit() {
        let errs = validate(&draft("", "bad", "x", "9"));
        let fields: Vec<_> = errs.fields().collect();
        assert_eq!(fields, FormField::ALL.to_vec());
    }

    #[test]
    fn validate_is_idempotent() {
        let d = draft("", "bad", "customer", "1");
        assert_eq!(validate(&d), validate(&d));
    }
}
