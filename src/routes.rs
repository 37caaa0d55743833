use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tracing::warn;

use crate::attendance;
use crate::crypto;
use crate::error::AppError;
use crate::feed::{self, FEED_INTERVAL, FeedSubscription};
use crate::identity;
use crate::models::{AttendanceRecord, RegistrationKeys};
use crate::qr::{self, IdentityClaim};
use crate::registration::{self, RegistrationForm};
use crate::state::SharedState;
use crate::user::{Member, Role};

/// The scan path sits on an interactive UI; a hung storage read surfaces as
/// a retryable timeout instead of a frozen scanner.
const SCAN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
pub struct ScanVerifyRequest {
    encrypted: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedUser {
    student_id: String,
    first_name: String,
    last_name: String,
    role: Role,
}

impl From<Member> for VerifiedUser {
    fn from(member: Member) -> Self {
        Self {
            student_id: member.student_id,
            first_name: member.first_name,
            last_name: member.last_name,
            role: member.role,
        }
    }
}

#[derive(Serialize)]
pub struct ScanVerifyResponse {
    ok: bool,
    message: &'static str,
    user: VerifiedUser,
}

pub async fn scan_verify_handler(
    State(state): State<SharedState>,
    Json(request): Json<ScanVerifyRequest>,
) -> Result<Json<ScanVerifyResponse>, AppError> {
    let member = timeout(SCAN_DEADLINE, async {
        let plaintext = crypto::decrypt(&request.encrypted, &state.config.qr_secret)?;
        let claim = qr::parse(&plaintext)?;
        identity::verify(state.store.as_ref(), &claim).await
    })
    .await
    .map_err(|_| AppError::ScanTimeout)??;

    Ok(Json(ScanVerifyResponse {
        ok: true,
        message: "User verified",
        user: member.into(),
    }))
}

#[derive(Deserialize)]
pub enum ScanType {
    TimeIn,
    TimeOut,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAttendanceRequest {
    scan_type: ScanType,
    payload: IdentityClaim,
    event_id: String,
}

#[derive(Serialize)]
pub struct ScanAttendanceResponse {
    ok: bool,
    message: &'static str,
    data: AttendanceRecord,
}

pub async fn scan_attendance_handler(
    State(state): State<SharedState>,
    Json(request): Json<ScanAttendanceRequest>,
) -> Result<Json<ScanAttendanceResponse>, AppError> {
    let store = state.store.as_ref();
    let student_number = &request.payload.student_id;

    let (record, message) = match request.scan_type {
        ScanType::TimeIn => {
            let record = attendance::time_in(store, student_number, &request.event_id).await?;
            (record, "Time-in recorded successfully")
        }
        ScanType::TimeOut => {
            let record = attendance::time_out(store, student_number, &request.event_id).await?;
            attendance::award_points(store, &record, state.config.reward_min_ms).await;
            (record, "Time-out recorded successfully")
        }
    };

    Ok(Json(ScanAttendanceResponse {
        ok: true,
        message,
        data: record,
    }))
}

pub async fn register_handler(
    State(state): State<SharedState>,
    Path(event_id): Path<String>,
    Json(form): Json<RegistrationForm>,
) -> Result<impl IntoResponse, AppError> {
    let created = registration::register(state.store.as_ref(), &event_id, form).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Serialize)]
pub struct RegistrationStatus {
    registered: bool,
}

pub async fn check_registration_handler(
    State(state): State<SharedState>,
    Path(event_id): Path<String>,
    Json(keys): Json<RegistrationKeys>,
) -> Result<Json<RegistrationStatus>, AppError> {
    let registered = registration::is_registered(state.store.as_ref(), &event_id, &keys).await?;

    Ok(Json(RegistrationStatus { registered }))
}

pub async fn attendance_list_handler(
    State(state): State<SharedState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let records = state.store.list_attendance(&event_id).await?;

    Ok(Json(records))
}

pub async fn attendance_feed_handler(
    State(state): State<SharedState>,
    Path(event_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let FeedSubscription { frames, guard } =
        feed::subscribe(state.store.clone(), event_id, FEED_INTERVAL);

    // the guard lives inside the stream: viewer disconnect drops the stream,
    // which cancels the polling loop
    let stream = ReceiverStream::new(frames).map(move |frame| {
        let _watching = &guard;
        let event = match Event::default().json_data(&frame) {
            Ok(event) => event,
            Err(err) => {
                warn!("Feed frame serialization failed: {err}");
                Event::default().comment("frame dropped")
            }
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
