use std::cmp::Ordering;

use crate::app::{AppState, SortColumn, SortState};
use crate::model::Usuario;

/// Whether `u` matches the global filter. `q` must already be lower-cased.
pub fn matches_query(u: &Usuario, q: &str) -> bool {
    q.is_empty()
        || u.name.to_lowercase().contains(q)
        || u.email.to_lowercase().contains(q)
        || u.role.to_lowercase().contains(q)
}

fn compare(a: &Usuario, b: &Usuario, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortColumn::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        SortColumn::Role => a.role.cmp(&b.role),
        SortColumn::Active => a.active.cmp(&b.active),
    }
}

pub fn sort_users(users: &mut [Usuario], sort: SortState) {
    users.sort_by(|a, b| {
        let ord = compare(a, b, sort.column);
        if sort.ascending { ord } else { ord.reverse() }
    });
}

/// Rebuild the visible rows from the loaded collection: filter, then sort.
///
/// The selection is kept on the same record when it is still visible,
/// otherwise it falls back to the first row.
pub fn apply_search(app: &mut AppState) {
    let selected_id = app.users.get(app.selected_index).map(|u| u.id);
    let q = app.search_query.to_lowercase();
    app.users = app
        .users_all
        .iter()
        .filter(|u| matches_query(u, &q))
        .cloned()
        .collect();
    if let Some(sort) = app.sort {
        sort_users(&mut app.users, sort);
    }
    app.selected_index = selected_id
        .and_then(|id| app.users.iter().position(|u| u.id == id))
        .unwrap_or(0);
}
