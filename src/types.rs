use crate::utils::try_respond;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use log::{debug, error};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::{Error as JsonError, Json};
use serde_json::Value;

pub const BAD_REQUEST: &str = "Bad Request";
pub const ARTICLE_NOT_FOUND: &str = "No Article With That Id Found";
pub const COMMENT_NOT_FOUND: &str = "No Comment With That Id Found";
pub const TOPIC_NOT_FOUND: &str = "That Topic Cannot Be Found";
pub const USER_NOT_FOUND: &str = "No User With That Username Can Be Found";
pub const AUTHOR_NOT_FOUND: &str = "User Cannot Be Found";
pub const VOTES_NOT_A_NUMBER: &str = "inc_votes Must Be A Number";

/// Turns a deserialized request body into the value a handler works with.
pub trait Validate
where
    Self: Sized,
{
    type Valid;
    fn validate(self) -> Result<Self::Valid, ApiError>;
}

#[derive(Debug)]
pub enum ApiError {
    Diesel(DieselError),
    Request(Status, &'static str),
}

impl ApiError {
    pub fn bad_request(msg: &'static str) -> ApiError {
        ApiError::Request(Status::BadRequest, msg)
    }

    pub fn not_found(msg: &'static str) -> ApiError {
        ApiError::Request(Status::NotFound, msg)
    }

    /// The status and message a client sees for this error.
    pub fn translate(&self) -> (Status, &'static str) {
        match self {
            ApiError::Request(status, msg) => (*status, *msg),
            ApiError::Diesel(DieselError::NotFound) => (Status::NotFound, "Not Found"),
            ApiError::Diesel(DieselError::DatabaseError(kind, info)) => match kind {
                DatabaseErrorKind::ForeignKeyViolation => missing_reference(&**info),
                DatabaseErrorKind::NotNullViolation => {
                    (Status::BadRequest, "Incorrect Information For Request")
                }
                DatabaseErrorKind::UniqueViolation => (Status::BadRequest, "Resource Already Exists"),
                // Postgres reports overflowing arithmetic, such as votes pushed
                // past the column's range, as "integer out of range".
                _ if info.message().contains("out of range") => {
                    (Status::BadRequest, BAD_REQUEST)
                }
                _ => (Status::InternalServerError, "Internal Server Error"),
            },
            ApiError::Diesel(_) => (Status::InternalServerError, "Internal Server Error"),
        }
    }
}

/// Foreign keys are named `<table>_<column>_fkey`; the column says which
/// referenced row is absent.
fn missing_reference(info: &(dyn DatabaseErrorInformation + Send + Sync)) -> (Status, &'static str) {
    let reference = info
        .constraint_name()
        .or_else(|| info.details())
        .unwrap_or_else(|| info.message());
    if reference.contains("article_id") {
        (Status::NotFound, ARTICLE_NOT_FOUND)
    } else if reference.contains("author") {
        (Status::NotFound, AUTHOR_NOT_FOUND)
    } else if reference.contains("topic") {
        (Status::NotFound, TOPIC_NOT_FOUND)
    } else {
        (Status::BadRequest, BAD_REQUEST)
    }
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        ApiError::Diesel(err)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let (status, msg) = self.translate();
        if status == Status::InternalServerError {
            error!("{} {} failed: {:?}", req.method(), req.uri(), self);
        } else {
            debug!("{} {} rejected with {}: {}", req.method(), req.uri(), status, msg);
        }
        try_respond(req, json!({ "msg": msg }), status)
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// A JSON body whose syntax errors are reported by the handler instead of a
/// catcher.
pub type JsonBody<'r, T> = Result<Json<T>, JsonError<'r>>;

pub fn validated<T: Validate>(body: JsonBody<T>) -> Result<T::Valid, ApiError> {
    match body {
        Ok(json) => json.into_inner().validate(),
        Err(e) => {
            debug!("unreadable request body: {:?}", e);
            Err(ApiError::bad_request(BAD_REQUEST))
        }
    }
}

/// Numeric path segments are parsed here rather than by the router so that
/// a malformed id is a 400 and not an unmatched route.
pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::bad_request(BAD_REQUEST))
}

/// Shape of a loosely typed body field.
#[derive(Debug, PartialEq)]
pub enum Field {
    Missing,
    NotString,
    Text(String),
}

impl From<Option<Value>> for Field {
    fn from(value: Option<Value>) -> Field {
        match value {
            None | Some(Value::Null) => Field::Missing,
            Some(Value::String(ref s)) if s.is_empty() => Field::Missing,
            Some(Value::String(s)) => Field::Text(s),
            Some(_) => Field::NotString,
        }
    }
}

/// Any JSON string, the empty one included.
pub fn string_value(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Reads a vote delta, which must be an integer that fits the votes column.
pub fn vote_delta(value: Option<Value>) -> Result<i32, ApiError> {
    value
        .as_ref()
        .and_then(Value::as_i64)
        .and_then(|delta| i32::try_from(delta).ok())
        .ok_or_else(|| ApiError::bad_request(VOTES_NOT_A_NUMBER))
}

#[derive(Debug, Deserialize)]
pub struct VoteChange {
    inc_votes: Option<Value>,
}

impl Validate for VoteChange {
    type Valid = i32;
    fn validate(self) -> Result<i32, ApiError> {
        vote_delta(self.inc_votes)
    }
}
