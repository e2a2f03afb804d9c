//! JSON request model and dispatch
//!
//! Every request is an object with an `op` field:
//!
//! ```json
//! {"op": "create_new", "document": {"name": "Ada"}, "effective_on": "2020-01-01T00:00:00Z"}
//! {"op": "correct_struct", "id": "a", "version": 1, "path": "name", "value": null, "reason": "typo"}
//! {"op": "get_effective", "id": "a", "at": "2020-06-01T00:00:00Z"}
//! ```
//!
//! Corrections must carry `value` explicitly; `null` sets the field to null.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::mutator::CorrectionValue;
use crate::persistence::{TemporalError, TemporalPersistence};
use crate::temporal::{ContextHandle, CorrectedPair, Document, TemporalSnapshot};

/// A request error answered with an error response.
#[derive(Debug)]
pub struct RequestError {
    pub code: &'static str,
    pub message: String,
    /// The store can no longer be trusted; serving must stop.
    pub fatal: bool,
}

impl RequestError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BITEMPORAL_BAD_REQUEST",
            message: message.into(),
            fatal: false,
        }
    }
}

impl From<TemporalError> for RequestError {
    fn from(e: TemporalError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            fatal: e.is_fatal(),
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(e: serde_json::Error) -> Self {
        Self::bad_request(e.to_string())
    }
}

/// Deserializes a field that must be present, keeping an explicit `null`.
fn required_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Parsed request
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateNew {
        document: Map<String, Value>,
        #[serde(default)]
        effective_on: Option<DateTime<Utc>>,
        #[serde(default)]
        comment: Option<String>,
    },
    AppendVersion {
        document: Document,
        #[serde(default)]
        effective_on: Option<DateTime<Utc>>,
        #[serde(default)]
        comment: Option<String>,
    },
    CorrectStruct {
        id: String,
        version: u32,
        path: String,
        #[serde(default, deserialize_with = "required_value")]
        value: Option<Value>,
        reason: String,
    },
    CorrectStructAll {
        id: String,
        path: String,
        #[serde(default, deserialize_with = "required_value")]
        value: Option<Value>,
        reason: String,
    },
    CorrectEffectiveOn {
        id: String,
        version: u32,
        effective_on: DateTime<Utc>,
        reason: String,
    },
    GetEffective {
        id: String,
        at: DateTime<Utc>,
    },
    GetCurrent {
        id: String,
    },
    GetLast {
        id: String,
    },
    GetVersion {
        id: String,
        version: u32,
        #[serde(default)]
        revision: Option<u32>,
    },
    GetHandle {
        handle: ContextHandle<String>,
    },
    /// Every revision, newest first
    History {
        id: String,
        #[serde(flatten)]
        range: HistoryRange,
    },
    /// Latest revision per version, newest first
    Versions {
        id: String,
        #[serde(flatten)]
        range: HistoryRange,
    },
}

/// Optional history bounds: by version number or by effective-on instant.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryRange {
    #[serde(default)]
    pub from_version: Option<u32>,
    #[serde(default)]
    pub until_version: Option<u32>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

enum Bounds {
    Versions(u32, u32),
    Effective(Option<DateTime<Utc>>, Option<DateTime<Utc>>),
}

impl HistoryRange {
    fn bounds(&self) -> Result<Bounds, RequestError> {
        let by_version = self.from_version.is_some() || self.until_version.is_some();
        let by_effective = self.from.is_some() || self.until.is_some();
        match (by_version, by_effective) {
            (true, true) => Err(RequestError::bad_request(
                "Use either version bounds or effective-on bounds, not both",
            )),
            (true, false) => Ok(Bounds::Versions(
                self.from_version.unwrap_or(1),
                self.until_version.unwrap_or(u32::MAX),
            )),
            _ => Ok(Bounds::Effective(self.from, self.until)),
        }
    }
}

impl Request {
    /// Parses a JSON request object.
    pub fn parse(value: Value) -> Result<Self, RequestError> {
        Ok(serde_json::from_value(value)?)
    }
}

fn correction_value(value: Option<Value>) -> Result<CorrectionValue, RequestError> {
    value
        .map(CorrectionValue::from)
        .ok_or_else(|| RequestError::bad_request("Correction requires 'value' (use null to clear)"))
}

/// Builds the document for `create_new`, assigning a UUID v4 when `id` is absent.
fn new_document(mut fields: Map<String, Value>) -> Result<Document, RequestError> {
    match fields.get("id") {
        None | Some(Value::Null) => {
            fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(RequestError::bad_request(format!(
                "Document id must be a string, got {}",
                other
            )))
        }
    }
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// JSON form of a snapshot
pub fn snapshot_json(snapshot: &TemporalSnapshot<Document>) -> Value {
    json!({
        "handle": snapshot.handle(),
        "context": snapshot.context(),
        "structure": snapshot.structure(),
    })
}

fn optional_json(snapshot: Option<TemporalSnapshot<Document>>) -> Value {
    snapshot.as_ref().map_or(Value::Null, snapshot_json)
}

fn list_json(snapshots: &[TemporalSnapshot<Document>]) -> Value {
    Value::Array(snapshots.iter().map(snapshot_json).collect())
}

/// JSON form of a corrected pair
pub fn pair_json(pair: &CorrectedPair<Document>) -> Value {
    json!({
        "original": snapshot_json(pair.original()),
        "corrected": snapshot_json(pair.corrected()),
    })
}

fn pairs_json(pairs: &[CorrectedPair<Document>]) -> Value {
    Value::Array(pairs.iter().map(pair_json).collect())
}

/// Executes one request against `engine` and returns the response data.
pub fn dispatch<P>(engine: &P, request: Request) -> Result<Value, RequestError>
where
    P: TemporalPersistence<Document>,
{
    let data = match request {
        Request::CreateNew {
            document,
            effective_on,
            comment,
        } => {
            let document = new_document(document)?;
            let effective_on = effective_on.unwrap_or_else(Utc::now);
            snapshot_json(&engine.create_new(document, effective_on, comment)?)
        }
        Request::AppendVersion {
            document,
            effective_on,
            comment,
        } => {
            let effective_on = effective_on.unwrap_or_else(Utc::now);
            snapshot_json(&engine.append_version(document, effective_on, comment)?)
        }
        Request::CorrectStruct {
            id,
            version,
            path,
            value,
            reason,
        } => {
            let value = correction_value(value)?;
            match engine.correct_struct_by_version(&id, version, &path, value, &reason)? {
                Some(pair) => pair_json(&pair),
                None => Value::Null,
            }
        }
        Request::CorrectStructAll {
            id,
            path,
            value,
            reason,
        } => {
            let value = correction_value(value)?;
            pairs_json(&engine.correct_struct_all_versions(&id, &path, value, &reason)?)
        }
        Request::CorrectEffectiveOn {
            id,
            version,
            effective_on,
            reason,
        } => pairs_json(&engine.correct_context_effective_on(&id, version, effective_on, &reason)?),
        Request::GetEffective { id, at } => optional_json(engine.get_by_id_effective(&id, at)?),
        Request::GetCurrent { id } => optional_json(engine.get_by_id_current(&id)?),
        Request::GetLast { id } => optional_json(engine.get_by_id_last(&id)?),
        Request::GetVersion {
            id,
            version,
            revision,
        } => match revision {
            Some(revision) => {
                optional_json(engine.get_by_id_version_and_revision(&id, version, revision)?)
            }
            None => optional_json(engine.get_by_id_and_version(&id, version)?),
        },
        Request::GetHandle { handle } => optional_json(engine.get_by_context_handle(&handle)?),
        Request::History { id, range } => match range.bounds()? {
            Bounds::Versions(from, until) => {
                list_json(&engine.get_all_versions_and_revisions_by_version(&id, from, until)?)
            }
            Bounds::Effective(from, until) => {
                list_json(&engine.get_all_versions_and_revisions_by_effective(&id, from, until)?)
            }
        },
        Request::Versions { id, range } => match range.bounds()? {
            Bounds::Versions(from, until) => {
                list_json(&engine.get_all_versions_by_version(&id, from, until)?)
            }
            Bounds::Effective(from, until) => {
                list_json(&engine.get_all_versions_by_effective(&id, from, until)?)
            }
        },
    };
    Ok(data)
}

/// Outcome of one request: the envelope to write, and the error if it was fatal.
#[derive(Debug)]
pub struct Handled {
    pub response: Value,
    pub fatal: Option<RequestError>,
}

/// Parses and executes a raw request, producing the response envelope.
pub fn handle<P>(engine: &P, raw: Value) -> Handled
where
    P: TemporalPersistence<Document>,
{
    match Request::parse(raw).and_then(|request| dispatch(engine, request)) {
        Ok(data) => Handled {
            response: super::io::ok_envelope(data),
            fatal: None,
        },
        Err(e) => Handled {
            response: super::io::error_envelope(e.code, &e.message),
            fatal: e.fatal.then_some(e),
        },
    }
}
