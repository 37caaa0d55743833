//! # Redis
//!
//! Backing store for the member registry, registration ledger, and
//! attendance log.
//!
//! ## Requirements
//!
//! - Fast lookups keyed by student number per event
//! - Atomic claim of uniqueness keys under concurrent submissions
//! - Atomic point increments for reward awards
//!
//! ## Layout
//!
//! - `members` hash: studentId -> member JSON
//! - `member_points` hash: studentId -> int, mutated only by **HINCRBY**
//! - `event:{id}:registrations` hash: studentNumber -> registration JSON
//! - `event:{id}:registration_keys` hash: one field per identity dimension
//!   (`account:..`, `email:..`, `number:..`), claimed with **HSETNX**
//! - `event:{id}:attendance` hash: studentNumber -> open record JSON,
//!   claimed with **HSETNX** (at most one record per person per event)
//! - `event:{id}:attendance_out` hash: studentNumber -> RFC 3339 close time,
//!   claimed with **HSETNX** (a time-out can only be written once)
//!
//! HSETNX is the arbiter for every uniqueness rule; the application-level
//! existence checks in front of it are fast paths only. Records are merged
//! with the `attendance_out` hash on every read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::models::{AttendanceRecord, Registration, RegistrationKeys};
use crate::store::{CloseOutcome, Store};
use crate::user::Member;

const MEMBERS_KEY: &str = "members";
const POINTS_KEY: &str = "member_points";

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}

fn registrations_key(event_id: &str) -> String {
    format!("event:{event_id}:registrations")
}

fn registration_keys_key(event_id: &str) -> String {
    format!("event:{event_id}:registration_keys")
}

fn attendance_key(event_id: &str) -> String {
    format!("event:{event_id}:attendance")
}

fn attendance_out_key(event_id: &str) -> String {
    format!("event:{event_id}:attendance_out")
}

fn key_fields(keys: &RegistrationKeys) -> Vec<String> {
    let mut fields = vec![
        format!("email:{}", keys.school_email),
        format!("number:{}", keys.student_number),
    ];
    if let Some(account_id) = &keys.account_id {
        fields.push(format!("account:{account_id}"));
    }
    fields
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn find_member(&self, student_id: &str) -> Result<Option<Member>, StoreError> {
        let mut conn = self.connection.clone();

        let json: Option<String> = conn.hget(MEMBERS_KEY, student_id).await?;
        let Some(json) = json else {
            return Ok(None);
        };

        let mut member: Member = decode(&json)?;
        let points: Option<i64> = conn.hget(POINTS_KEY, student_id).await?;
        member.points = points.unwrap_or(0);

        Ok(Some(member))
    }

    async fn insert_member(&self, member: Member) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();

        let _: () = conn
            .hset(MEMBERS_KEY, &member.student_id, encode(&member)?)
            .await?;

        Ok(())
    }

    async fn add_points(&self, student_id: &str, amount: i64) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();

        let known: bool = conn.hexists(MEMBERS_KEY, student_id).await?;
        if !known {
            return Ok(false);
        }

        let _: i64 = conn.hincr(POINTS_KEY, student_id, amount).await?;
        Ok(true)
    }

    async fn registration_exists(
        &self,
        event_id: &str,
        keys: &RegistrationKeys,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let hash = registration_keys_key(event_id);

        for field in key_fields(keys) {
            let taken: bool = conn.hexists(&hash, &field).await?;
            if taken {
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn insert_registration(
        &self,
        registration: Registration,
    ) -> Result<Registration, StoreError> {
        let mut conn = self.connection.clone();
        let hash = registration_keys_key(&registration.event_id);
        let id = registration.id.to_string();

        let mut claimed = Vec::new();
        for field in key_fields(&registration.keys()) {
            let won: bool = conn.hset_nx(&hash, &field, &id).await?;
            if !won {
                // another submission holds this dimension; release what we took
                for field in &claimed {
                    let _: () = conn.hdel(&hash, field).await?;
                }
                return Err(StoreError::Duplicate);
            }
            claimed.push(field);
        }

        let _: () = conn
            .hset(
                registrations_key(&registration.event_id),
                &registration.student_number,
                encode(&registration)?,
            )
            .await?;

        Ok(registration)
    }

    async fn find_registration(
        &self,
        event_id: &str,
        student_number: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let mut conn = self.connection.clone();

        let json: Option<String> = conn
            .hget(registrations_key(event_id), student_number)
            .await?;

        json.as_deref().map(decode).transpose()
    }

    async fn insert_attendance(
        &self,
        record: AttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut conn = self.connection.clone();

        let won: bool = conn
            .hset_nx(
                attendance_key(&record.event_id),
                &record.student_number,
                encode(&record)?,
            )
            .await?;
        if !won {
            return Err(StoreError::Duplicate);
        }

        Ok(record)
    }

    async fn find_attendance(
        &self,
        event_id: &str,
        student_number: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut conn = self.connection.clone();

        let json: Option<String> = conn.hget(attendance_key(event_id), student_number).await?;
        let Some(json) = json else {
            return Ok(None);
        };

        let mut record: AttendanceRecord = decode(&json)?;
        let out: Option<String> = conn
            .hget(attendance_out_key(event_id), student_number)
            .await?;
        if let Some(raw) = out {
            record.time_out = Some(decode_time(&raw)?);
        }

        Ok(Some(record))
    }

    async fn close_attendance(
        &self,
        event_id: &str,
        student_number: &str,
        time_out: DateTime<Utc>,
    ) -> Result<CloseOutcome, StoreError> {
        let mut conn = self.connection.clone();

        let json: Option<String> = conn.hget(attendance_key(event_id), student_number).await?;
        let Some(json) = json else {
            return Ok(CloseOutcome::NoRecord);
        };
        let mut record: AttendanceRecord = decode(&json)?;

        let time_out = time_out.max(record.time_in);
        let won: bool = conn
            .hset_nx(
                attendance_out_key(event_id),
                student_number,
                time_out.to_rfc3339(),
            )
            .await?;
        if !won {
            return Ok(CloseOutcome::AlreadyClosed);
        }

        record.time_out = Some(time_out);
        Ok(CloseOutcome::Closed(record))
    }

    async fn list_attendance(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut conn = self.connection.clone();

        let rows: std::collections::HashMap<String, String> =
            conn.hgetall(attendance_key(event_id)).await?;
        let outs: std::collections::HashMap<String, String> =
            conn.hgetall(attendance_out_key(event_id)).await?;

        let mut records = Vec::with_capacity(rows.len());
        for (student_number, json) in rows {
            let mut record: AttendanceRecord = decode(&json)?;
            if let Some(raw) = outs.get(&student_number) {
                record.time_out = Some(decode_time(raw)?);
            }
            records.push(record);
        }
        records.sort_by(|a, b| b.time_in.cmp(&a.time_in));

        Ok(records)
    }
}
