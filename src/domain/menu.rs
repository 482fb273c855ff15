use crate::domain::models::{MenuItem, Role};
use serde::Serialize;

/// Whether `viewer` may see an entry gated by `item`'s required role.
///
/// Items whose required role cannot be resolved stay hidden, as do all gated
/// items for anonymous viewers.
pub fn is_visible(item: &MenuItem, viewer: Option<Role>) -> bool {
    let Some(required) = item.required_role.as_ref() else {
        return true;
    };
    match (viewer, required.resolve()) {
        (Some(viewer), Some(required)) => viewer.includes(required),
        _ => false,
    }
}

/// Filters the candidate menu, preserving source order.
pub fn visible_items(items: &[MenuItem], viewer: Option<Role>) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|item| is_visible(item, viewer))
        .cloned()
        .collect()
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationView {
    pub links: Vec<NavLink>,
    pub show_admin: bool,
    pub authenticated: bool,
    /// Role resolution has not finished; callers must not render gated
    /// affordances yet.
    pub pending: bool,
}

impl NavigationView {
    pub fn build(
        items: &[MenuItem],
        viewer: Option<Role>,
        authenticated: bool,
        show_admin: bool,
    ) -> Self {
        let links = visible_items(items, viewer)
            .into_iter()
            .map(|item| NavLink {
                href: format!("/{}", item.slug),
                label: item.label,
            })
            .collect();
        Self {
            links,
            show_admin,
            authenticated,
            pending: false,
        }
    }

    pub fn pending() -> Self {
        Self {
            links: Vec::new(),
            show_admin: false,
            authenticated: false,
            pending: true,
        }
    }
}
