// Unit tests for usuarios-admin
// These tests work with the public API without modifying the main codebase

#[cfg(test)]
mod model_tests {
    use usuarios_admin::model::{Draft, Role, UserPayload, Usuario};

    #[test]
    fn test_usuario_decodes_english_fields() {
        let json = r#"{"id":7,"name":"Ana","email":"ana@x.com","role":"admin","active":1,"created_at":"2024-03-01T10:00:00Z"}"#;
        let u: Usuario = serde_json::from_str(json).unwrap();
        assert_eq!(u.id, 7);
        assert_eq!(u.role, "admin");
        assert!(u.is_active());
        assert_eq!(u.created_at.as_deref(), Some("2024-03-01T10:00:00Z"));
    }

    #[test]
    fn test_usuario_decodes_legacy_field_names() {
        let json = r#"{"idusuario":3,"nombre":"Luis","email":"l@x.com","rol":"customer","activo":0,"fechacreacion":"2023-12-31"}"#;
        let u: Usuario = serde_json::from_str(json).unwrap();
        assert_eq!(u.id, 3);
        assert_eq!(u.name, "Luis");
        assert_eq!(u.status_label(), "Inactivo");
        assert_eq!(u.created_at.as_deref(), Some("2023-12-31"));
    }

    #[test]
    fn test_usuario_without_creation_date() {
        let json = r#"{"id":1,"name":"A","email":"a@b.co","role":"customer","active":1}"#;
        let u: Usuario = serde_json::from_str(json).unwrap();
        assert!(u.created_at.is_none());
        assert_eq!(u.display_role(), "Customer");
    }

    #[test]
    fn test_role_cycle() {
        assert_eq!(Role::cycle_from("customer"), Role::Admin);
        assert_eq!(Role::cycle_from("admin"), Role::Customer);
        assert_eq!(Role::parse("ADMIN"), None);
    }

    #[test]
    fn test_draft_defaults_and_payload() {
        let mut d = Draft::default();
        assert_eq!(d.role, "customer");
        assert_eq!(d.active, "1");
        d.name = "  Bob ".into();
        d.email = " bob@x.com ".into();
        assert_eq!(
            d.to_payload(),
            UserPayload {
                name: "Bob".into(),
                email: "bob@x.com".into(),
                role: "customer".into(),
                active: 1,
            }
        );
    }

    #[test]
    fn test_legacy_record_edits_write_english_keys() {
        let json = r#"{"idusuario":4,"nombre":"Luz","email":"luz@x.com","rol":"cliente","activo":1}"#;
        let u: Usuario = serde_json::from_str(json).unwrap();
        let mut d = Draft::from_usuario(&u);
        assert!(usuarios_admin::validate::validate(&d)
            .contains(usuarios_admin::validate::FormField::Role));

        d.role = Role::cycle_from(&d.role).as_str().to_string();
        assert!(usuarios_admin::validate::validate(&d).is_empty());
        let v = serde_json::to_value(d.to_payload()).unwrap();
        assert_eq!(v, serde_json::json!({"name":"Luz","email":"luz@x.com","role":"customer","active":1}));
    }

    #[test]
    fn test_payload_serializes_english_keys() {
        let p = UserPayload {
            name: "Bob".into(),
            email: "bob@x.com".into(),
            role: "admin".into(),
            active: 0,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v, serde_json::json!({"name":"Bob","email":"bob@x.com","role":"admin","active":0}));
    }
}

#[cfg(test)]
mod validate_tests {
    use usuarios_admin::model::Draft;
    use usuarios_admin::validate::{self, FormField};

    fn draft(name: &str, email: &str, role: &str, active: &str) -> Draft {
        Draft {
            name: name.into(),
            email: email.into(),
            role: role.into(),
            active: active.into(),
        }
    }

    #[test]
    fn test_valid_draft_has_no_errors() {
        assert!(validate::validate(&draft("Ana", "ana@x.com", "admin", "0")).is_empty());
    }

    #[test]
    fn test_every_rule_is_reported() {
        let errs = validate::validate(&draft("  ", "nope", "guest", "2"));
        assert_eq!(errs.len(), 4);
        assert_eq!(errs.get(FormField::Name), Some(validate::NAME_REQUIRED));
        assert_eq!(errs.get(FormField::Email), Some(validate::EMAIL_INVALID));
        assert_eq!(errs.get(FormField::Role), Some(validate::ROLE_INVALID));
        assert_eq!(errs.get(FormField::Active), Some(validate::ACTIVE_INVALID));
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate::is_valid_email("a@b.co"));
        assert!(!validate::is_valid_email("a b@c.com"));
        assert!(!validate::is_valid_email("a@b"));
        assert!(!validate::is_valid_email("@b.co"));
    }

    #[test]
    fn test_blank_active_counts_as_zero() {
        assert!(!validate::validate(&draft("Ana", "ana@x.com", "customer", "")).contains(FormField::Active));
        assert!(validate::validate(&draft("Ana", "ana@x.com", "customer", "abc")).contains(FormField::Active));
    }
}

#[cfg(test)]
mod search_tests {
    use usuarios_admin::app::{AppState, SortColumn, SortState};
    use usuarios_admin::model::Usuario;
    use usuarios_admin::search::{apply_search, matches_query, sort_users};

    fn mk(id: u64, name: &str, email: &str, role: &str, active: i64) -> Usuario {
        Usuario {
            id,
            name: name.into(),
            email: email.into(),
            role: role.into(),
            active,
            created_at: None,
        }
    }

    #[test]
    fn test_query_matches_name_email_role_only() {
        let u = mk(42, "Ana", "ana@x.com", "admin", 1);
        assert!(matches_query(&u, "an"));
        assert!(matches_query(&u, "x.com"));
        assert!(matches_query(&u, "adm"));
        assert!(!matches_query(&u, "42"));
        assert!(!matches_query(&u, "activo"));
    }

    #[test]
    fn test_sort_descending_by_name() {
        let mut v = vec![mk(1, "bob", "b@x.com", "customer", 1), mk(2, "Ana", "a@x.com", "admin", 0)];
        sort_users(&mut v, SortState { column: SortColumn::Name, ascending: false });
        assert_eq!(v[0].name, "bob");
        sort_users(&mut v, SortState { column: SortColumn::Active, ascending: true });
        assert_eq!(v[0].id, 2);
    }

    #[test]
    fn test_apply_search_keeps_selected_record() {
        let mut app = AppState::new(10);
        app.users_all = vec![
            mk(1, "Ana", "ana@x.com", "admin", 1),
            mk(2, "Bob", "bob@y.com", "customer", 1),
            mk(3, "Bea", "bea@x.com", "customer", 0),
        ];
        apply_search(&mut app);
        app.selected_index = 2;
        app.search_query = "X.COM".into();
        apply_search(&mut app);
        assert_eq!(app.users.len(), 2);
        assert_eq!(app.selected_user().map(|u| u.id), Some(3));
    }
}

#[cfg(test)]
mod error_tests {
    use usuarios_admin::ApiError;

    #[test]
    fn test_error_display_is_user_facing() {
        assert_eq!(ApiError::Http { status: 500 }.to_string(), "HTTP error! status: 500");
        let rejected = ApiError::Rejected { status: 409, message: "Email duplicado".into() };
        assert_eq!(rejected.to_string(), "Email duplicado");
        assert_eq!(rejected.status(), Some(409));
        assert_eq!(ApiError::Decode("x".into()).status(), None);
    }
}

#[cfg(test)]
mod keymap_tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use usuarios_admin::app::keymap::{KeyAction, Keymap};

    #[test]
    fn test_custom_binding_overrides_default() {
        let km = Keymap::parse("NewUser = a\n");
        let ev = KeyEvent::new_with_kind(KeyCode::Char('a'), KeyModifiers::NONE, KeyEventKind::Press);
        assert_eq!(km.resolve(&ev), Some(KeyAction::NewUser));
        let n = KeyEvent::new_with_kind(KeyCode::Char('n'), KeyModifiers::NONE, KeyEventKind::Press);
        assert_eq!(km.resolve(&n), Some(KeyAction::NewUser));
    }
}
