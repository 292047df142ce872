//! Statistics API endpoint
//!
//! One dashboard query per call: barbers get their own figures, managers get
//! their barbershop's. Clients have no statistics surface.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::CatalogRepository,
    middleware::{AuthUser, Role},
    models::{DashboardStats, Period, StatsScope},
    services::StatsService,
    utils::{AppError, AppResult},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    period: Period,
    scope: Option<ScopeParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScopeParam {
    Barber,
    Manager,
}

async fn get_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<DashboardStats>> {
    let scope = resolve_scope(&auth_user, query.scope)?;

    // A manager token may outlive its barbershop.
    if let StatsScope::Barbershop(barbershop_id) = scope {
        CatalogRepository::get_barbershop(&state.db, barbershop_id)
            .await?
            .ok_or_else(|| AppError::not_found("Barbershop not found"))?;
    }

    let service = StatsService::new(state.db.clone());
    let stats = service.dashboard(scope, query.period).await?;

    Ok(Json(stats))
}

/// The requested scope must match the principal's role; the principal's own
/// ids are always used, never ids from the query string.
fn resolve_scope(auth_user: &AuthUser, requested: Option<ScopeParam>) -> AppResult<StatsScope> {
    match (auth_user.role, requested) {
        (Role::Barber, None | Some(ScopeParam::Barber)) => Ok(StatsScope::Barber(auth_user.id)),
        (Role::Manager, None | Some(ScopeParam::Manager)) => {
            let barbershop_id = auth_user
                .barbershop_id
                .ok_or_else(|| AppError::forbidden("Manager token is missing a barbershop"))?;
            Ok(StatsScope::Barbershop(barbershop_id))
        }
        _ => Err(AppError::forbidden(
            "Statistics are limited to barbers and managers",
        )),
    }
}
