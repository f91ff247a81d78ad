//! API handlers.
//!
//! Channels and duty cycles are taken as `u32` so every out-of-range number
//! is judged by the controller and reported through [`ApiError`]. Input that
//! is not a non-negative integer at all is rejected by the axum extractors
//! (400 for the path, 422 for the JSON body).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::controller::ControllerError;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub controller: String,
}

#[derive(Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct CapabilitiesView {
    pub pwm_enabled: bool,
    pub adc_enabled: bool,
    pub relay_active_high: bool,
    pub relay_channels: u8,
    pub pwm_channels: u8,
    pub adc_channels: u8,
}

#[derive(Serialize)]
pub struct RelayStatus {
    pub channel: u32,
    pub on: bool,
}

#[derive(Deserialize)]
pub struct RelayCommand {
    pub on: bool,
}

#[derive(Serialize, Deserialize)]
pub struct PwmCommand {
    pub duty: u32,
}

#[derive(Serialize)]
pub struct PwmStatus {
    pub channel: u32,
    pub duty: u32,
}

#[derive(Serialize)]
pub struct AdcReading {
    pub channel: u32,
    pub value: u16,
}

/// Controller failure surfaced to an API client.
pub struct ApiError(ControllerError);

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ControllerError::NotRunning | ControllerError::InvalidTransition { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ControllerError::InvalidChannel { .. } => StatusCode::NOT_FOUND,
            ControllerError::Disabled(_) => StatusCode::CONFLICT,
            ControllerError::InvalidDuty(_) => StatusCode::BAD_REQUEST,
            ControllerError::Init { .. }
            | ControllerError::Driver { .. }
            | ControllerError::Shutdown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = %status, "Controller request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub async fn health(State(state): State<ApiState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        controller: state.controller.state().to_string(),
    })
}

pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: crate::VERSION,
    })
}

pub async fn capabilities(State(state): State<ApiState>) -> Json<CapabilitiesView> {
    let caps = state.controller.capabilities();
    let layout = state.controller.layout();
    Json(CapabilitiesView {
        pwm_enabled: caps.pwm_enabled,
        adc_enabled: caps.adc_enabled,
        relay_active_high: caps.relay_active_high,
        relay_channels: layout.relays,
        pwm_channels: layout.pwm,
        adc_channels: layout.adc,
    })
}

pub async fn get_relay(
    State(state): State<ApiState>,
    Path(channel): Path<u32>,
) -> Result<Json<RelayStatus>, ApiError> {
    let on = state.controller.relay(channel)?;
    Ok(Json(RelayStatus { channel, on }))
}

pub async fn set_relay(
    State(state): State<ApiState>,
    Path(channel): Path<u32>,
    Json(command): Json<RelayCommand>,
) -> Result<Json<RelayStatus>, ApiError> {
    state.controller.set_relay(channel, command.on)?;
    Ok(Json(RelayStatus {
        channel,
        on: command.on,
    }))
}

pub async fn set_pwm(
    State(state): State<ApiState>,
    Path(channel): Path<u32>,
    Json(command): Json<PwmCommand>,
) -> Result<Json<PwmStatus>, ApiError> {
    state.controller.set_pwm(channel, command.duty)?;
    Ok(Json(PwmStatus {
        channel,
        duty: command.duty,
    }))
}

pub async fn read_adc(
    State(state): State<ApiState>,
    Path(channel): Path<u32>,
) -> Result<Json<AdcReading>, ApiError> {
    let value = state.controller.read_adc(channel)?;
    Ok(Json(AdcReading { channel, value }))
}
