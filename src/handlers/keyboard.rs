//! Paginated user-selection keyboards
//!
//! All admin flows share one keyboard shape: a page of user buttons, a
//! navigation row when more than one page exists, an optional action
//! button, and a cancel button.

use crate::models::User;
use crate::transport::{Button, Keyboard, CB_CANCEL, CB_NOOP, CB_PAGE_NEXT, CB_PAGE_PREV};
use crate::utils::helpers::format_user_label;

/// Users shown per keyboard page.
pub const PAGE_SIZE: usize = 10;

/// Build a selection keyboard from `users`, hiding already-picked handles.
///
/// `page` is clamped into `[0, total_pages - 1]`; the clamped value is
/// returned so callers can store it back into the flow state.
pub fn selection_keyboard(
    users: &[User],
    picked: &[String],
    page: usize,
    action: Option<Button>,
) -> (Keyboard, usize) {
    let candidates: Vec<&User> = users
        .iter()
        .filter(|u| !picked.iter().any(|p| p == &u.username))
        .collect();

    let total_pages = (candidates.len().div_ceil(PAGE_SIZE)).max(1);
    let page = page.min(total_pages - 1);

    let mut keyboard = Keyboard::default();

    let start = (page * PAGE_SIZE).min(candidates.len());
    let end = (start + PAGE_SIZE).min(candidates.len());
    for user in &candidates[start..end] {
        keyboard.push_row(vec![Button::new(format_user_label(user), user.username.clone())]);
    }

    if total_pages > 1 {
        let mut nav = Vec::new();
        if page > 0 {
            nav.push(Button::new("<<", CB_PAGE_PREV));
        }
        nav.push(Button::new(format!("Page {}/{}", page + 1, total_pages), CB_NOOP));
        if page < total_pages - 1 {
            nav.push(Button::new(">>", CB_PAGE_NEXT));
        }
        keyboard.push_row(nav);
    }

    if let Some(action) = action {
        keyboard.push_row(vec![action]);
    }

    keyboard.push_row(vec![Button::new("Cancel", CB_CANCEL)]);

    (keyboard, page)
}
