use crate::api::ApiClient;
use crate::domain::models::{AdminStats, Role, User};
use crate::error::{ClientError, ClientResult};
use serde::Serialize;

/// Super-admins see everyone; other viewers only see plain users.
pub fn is_listed(viewer: Option<Role>, target: &User) -> bool {
    viewer == Some(Role::SuperAdmin) || target.role() == Some(Role::User)
}

/// Same rule as listing: whoever a viewer sees, they may (de)activate.
pub fn can_toggle(viewer: Option<Role>, target: &User) -> bool {
    is_listed(viewer, target)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    #[serde(flatten)]
    pub user: User,
    pub can_toggle: bool,
}

pub async fn list(api: &ApiClient, token: &str, viewer: Option<Role>) -> ClientResult<Vec<UserRow>> {
    let users = api.list_users(token).await?;
    Ok(users
        .into_iter()
        .filter(|u| is_listed(viewer, u))
        .map(|user| UserRow {
            can_toggle: can_toggle(viewer, &user),
            user,
        })
        .collect())
}

/// Flips the activation flag of `user_id` and returns the new value. Hiding
/// the action from viewers who may not use it is the caller's job; the API
/// decides whether the change is allowed.
pub async fn toggle(api: &ApiClient, token: &str, user_id: i64) -> ClientResult<bool> {
    let users = api.list_users(token).await?;
    let user = users
        .iter()
        .find(|u| u.id == user_id)
        .ok_or_else(|| ClientError::NotFound(format!("user {user_id}")))?;
    let next = !user.is_active;
    api.toggle_user(token, user_id, next).await?;
    tracing::info!("User {} is now {}", user_id, if next { "active" } else { "inactive" });
    Ok(next)
}

pub async fn stats(api: &ApiClient, token: &str) -> ClientResult<AdminStats> {
    api.admin_stats(token).await
}
