//! Achievement routes.

use crate::error::Result;
use crate::format::achievement_title;
use crate::middleware::AuthUser;
use crate::models::Achievement;
use crate::routes::locale::RequestLocale;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/groups/{id}/achievements", get(list_achievements))
}

#[derive(Serialize)]
pub struct AchievementView {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub title: String,
}

/// Caller's achievements in a group, oldest first.
async fn list_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    RequestLocale(locale): RequestLocale,
) -> Result<Json<Vec<AchievementView>>> {
    let locale = state.config.format_context(locale).locale;
    let mut achievements = state
        .gateway
        .list_achievements(&user.session(), group_id)
        .await?;
    achievements.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));

    Ok(Json(
        achievements
            .into_iter()
            .map(|achievement| AchievementView {
                title: achievement_title(achievement.achievement_type, locale).to_string(),
                achievement,
            })
            .collect(),
    ))
}
