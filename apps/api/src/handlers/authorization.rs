use std::str::FromStr;

use axum::Json;
use axum::extract::State;
use vigil_application::AuthorizationService;
use vigil_core::{AppError, IdentityContext};
use vigil_domain::Action;

use crate::dto::{
    AuthorizationDecisionResponse, CapabilityCheckResponse, EvaluateAuthorizationRequest,
    FieldRestrictionsResponse, PermissionCheckResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;


/// Evaluates a batch of checks for a caller-supplied subject and tenant.
///
/// Only stored assignments grant anything; the body cannot assert
/// super-admin status or token claims.
///
/// All checks share one request scope, so roles and capabilities are
/// resolved at most once per call.
pub async fn evaluate_authorization_handler(
    State(state): State<AppState>,
    Json(payload): Json<EvaluateAuthorizationRequest>,
) -> ApiResult<Json<AuthorizationDecisionResponse>> {
    Ok(Json(
        evaluate(state.app_context.authorization_service(), payload).await?,
    ))
}

pub(crate) async fn evaluate(
    service: &AuthorizationService,
    payload: EvaluateAuthorizationRequest,
) -> ApiResult<AuthorizationDecisionResponse> {
    let identity = IdentityContext::try_from(payload.identity)?;
    let checks = payload
        .permissions
        .into_iter()
        .map(|check| Ok((Action::from_str(check.action.as_str())?, check.resource)))
        .collect::<Result<Vec<_>, AppError>>()?;

    let scope = service.scope(identity);

    let mut permissions = Vec::with_capacity(checks.len());
    for (action, resource) in checks {
        let allowed = scope.has_permission(resource.as_str(), action).await;
        permissions.push(PermissionCheckResponse {
            resource,
            action: action.as_str().to_owned(),
            allowed,
        });
    }

    let mut capability_checks = Vec::with_capacity(payload.capabilities.len());
    for code in payload.capabilities {
        let granted = scope.has_capability(code.as_str()).await;
        capability_checks.push(CapabilityCheckResponse { code, granted });
    }

    let mut field_restrictions = Vec::with_capacity(payload.field_resources.len());
    for resource in payload.field_resources {
        let restrictions = scope.field_restrictions(resource.as_str()).await;
        field_restrictions.push(FieldRestrictionsResponse::new(resource, &restrictions));
    }

    let view = scope.resolved_view().await;
    Ok(AuthorizationDecisionResponse {
        subject: view.subject,
        tenant_id: view.tenant_id.map(|tenant_id| tenant_id.to_string()),
        roles: view
            .roles
            .iter()
            .map(|role_key| role_key.as_str().to_owned())
            .collect(),
        capability_source: view.capability_source.as_str().to_owned(),
        capabilities: view
            .capabilities
            .iter()
            .map(|code| code.as_str().to_owned())
            .collect(),
        permissions,
        capability_checks,
        field_restrictions,
    })
}
