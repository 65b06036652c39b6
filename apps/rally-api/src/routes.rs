use axum::{
	Form, Json, Router,
	extract::{
		FromRequestParts, Query, Request, State,
		rejection::{FormRejection, JsonRejection},
	},
	http::{HeaderMap, StatusCode, header, request::Parts},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use rally_service::{
	CallLogRequest, CallLogResponse, CallStatusEvent, CancelRequest, CancelResponse,
	DispatchHandle, DispatchRequest, Error, PLAY_PATH, ProgressRequest, ProgressResponse,
	RosterEntry, RosterRequest, STATUS_PATH,
};

pub const TENANT_HEADER: &str = "X-Rally-Tenant-Id";

pub fn router(state: AppState) -> Router {
	let tenant_routes = Router::new()
		.route("/v1/dispatch", post(dispatch))
		.route("/v1/progress", get(progress))
		.route("/v1/cancel", post(cancel))
		.route("/v1/calls", get(calls))
		.route("/v1/campaign-recipients", get(campaign_recipients))
		.route_layer(middleware::from_fn_with_state(state.clone(), require_api_token));
	// The provider reaches these without tenant context or credentials.
	let telephony_routes = Router::new()
		.route(PLAY_PATH, get(playback).post(playback))
		.route(STATUS_PATH, post(call_status));

	Router::new()
		.route("/health", get(health))
		.merge(tenant_routes)
		.merge(telephony_routes)
		.with_state(state)
}

/// Tenant id taken from [`TENANT_HEADER`].
pub struct Tenant(pub String);
impl<S> FromRequestParts<S> for Tenant
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		let tenant_id = header_str(&parts.headers, TENANT_HEADER)
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.ok_or_else(|| {
				json_error(
					StatusCode::BAD_REQUEST,
					"invalid_request",
					format!("{TENANT_HEADER} header is required."),
				)
			})?;

		Ok(Self(tenant_id.to_string()))
	}
}

#[derive(Debug, Deserialize)]
struct DispatchBody {
	campaign_id: Uuid,
	message_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct CancelBody {
	campaign_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct CampaignQuery {
	campaign_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaybackQuery {
	message_id: Option<String>,
}

async fn require_api_token(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Result<Response, ApiError> {
	let Some(expected) = state.api_auth_token.as_deref() else {
		return Ok(next.run(request).await);
	};
	let presented = header_str(request.headers(), header::AUTHORIZATION.as_str())
		.and_then(|value| value.strip_prefix("Bearer "));

	if presented != Some(expected) {
		return Err(json_error(
			StatusCode::UNAUTHORIZED,
			"unauthorized",
			"A valid bearer token is required.",
		));
	}

	Ok(next.run(request).await)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn dispatch(
	State(state): State<AppState>,
	Tenant(tenant_id): Tenant,
	payload: Result<Json<DispatchBody>, JsonRejection>,
) -> Result<(StatusCode, Json<DispatchHandle>), ApiError> {
	let Json(body) = payload.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", err.body_text())
	})?;
	let handle = state
		.service
		.dispatch(DispatchRequest {
			tenant_id,
			campaign_id: body.campaign_id,
			message_id: body.message_id,
		})
		.await?;

	Ok((StatusCode::ACCEPTED, Json(handle)))
}

async fn progress(
	State(state): State<AppState>,
	Tenant(tenant_id): Tenant,
	Query(query): Query<CampaignQuery>,
) -> Result<Json<ProgressResponse>, ApiError> {
	let campaign_id = parse_uuid("campaign_id", query.campaign_id.as_deref())?;
	let response = state.service.progress(ProgressRequest { tenant_id, campaign_id }).await?;

	Ok(Json(response))
}

async fn cancel(
	State(state): State<AppState>,
	Tenant(tenant_id): Tenant,
	payload: Result<Json<CancelBody>, JsonRejection>,
) -> Result<Json<CancelResponse>, ApiError> {
	let Json(body) = payload.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", err.body_text())
	})?;
	let response = state
		.service
		.cancel(CancelRequest { tenant_id, campaign_id: body.campaign_id })
		.await?;

	Ok(Json(response))
}

async fn calls(
	State(state): State<AppState>,
	Tenant(tenant_id): Tenant,
	Query(query): Query<CampaignQuery>,
) -> Result<Json<CallLogResponse>, ApiError> {
	let campaign_id = parse_uuid("campaign_id", query.campaign_id.as_deref())?;
	let response = state.service.list_calls(CallLogRequest { tenant_id, campaign_id }).await?;

	Ok(Json(response))
}

async fn campaign_recipients(
	State(state): State<AppState>,
	Tenant(tenant_id): Tenant,
	Query(query): Query<CampaignQuery>,
) -> Result<Json<Vec<RosterEntry>>, ApiError> {
	let campaign_id = parse_uuid("campaign_id", query.campaign_id.as_deref())?;
	let response =
		state.service.campaign_recipients(RosterRequest { tenant_id, campaign_id }).await?;

	Ok(Json(response))
}

async fn playback(
	State(state): State<AppState>,
	Query(query): Query<PlaybackQuery>,
) -> Result<Response, ApiError> {
	// A malformed id gets the same spoken fallback as an unknown one.
	let message_id = query.message_id.as_deref().and_then(|raw| Uuid::parse_str(raw.trim()).ok());
	let playback = state.service.playback(message_id).await?;

	Ok(([(header::CONTENT_TYPE, playback.content_type)], playback.body).into_response())
}

async fn call_status(
	State(state): State<AppState>,
	payload: Result<Form<CallStatusEvent>, FormRejection>,
) -> Result<StatusCode, ApiError> {
	let event = match payload {
		Ok(Form(event)) => event,
		Err(err) => {
			tracing::debug!(error = %err, "Unreadable status callback. Ignoring.");

			return Ok(StatusCode::NO_CONTENT);
		},
	};

	state.service.handle_call_status(event).await?;

	Ok(StatusCode::NO_CONTENT)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|value| value.to_str().ok())
}

fn parse_uuid(field: &str, raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
		return Ok(None);
	};

	Uuid::parse_str(raw).map(Some).map_err(|_| {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", format!("{field} must be a UUID."))
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::NotFound { message } => json_error(StatusCode::NOT_FOUND, "not_found", message),
			Error::TenantMismatch { message } =>
				json_error(StatusCode::CONFLICT, "tenant_mismatch", message),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage error while serving request.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "Storage error.")
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
