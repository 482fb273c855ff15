use crate::domain::menu::{visible_items, NavigationView};
use crate::domain::models::MenuItem;
use crate::error::ClientResult;
use crate::domain::models::Role;
use crate::services::session::{Access, SessionResolver, SessionState, TokenStore};

/// Fetches the candidate menu for the session's audience and keeps what the
/// viewer may see.
pub async fn assemble<S: TokenStore>(session: &SessionResolver<S>) -> ClientResult<Vec<MenuItem>> {
    let items = match (session.state(), session.token()) {
        (SessionState::Authenticated { .. }, Some(token)) => session.api().menu_items(token).await?,
        _ => session.api().public_menu().await?,
    };
    let visible = visible_items(&items, session.role());
    tracing::debug!("Menu: {} of {} items visible", visible.len(), items.len());
    Ok(visible)
}

pub async fn navigation<S: TokenStore>(session: &SessionResolver<S>) -> ClientResult<NavigationView> {
    let admin = session.access(Role::Admin);
    if admin == Access::Pending {
        return Ok(NavigationView::pending());
    }
    let items = assemble(session).await?;
    let authenticated = session.identity().is_some();
    Ok(NavigationView::build(
        &items,
        session.role(),
        authenticated,
        admin == Access::Granted,
    ))
}
