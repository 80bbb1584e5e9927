use chrono::{NaiveDateTime, SecondsFormat};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use serde::Serializer;
use serde_json::Value;

pub fn try_respond(req: &Request, json: Value, status: Status) -> response::Result<'static> {
    Response::build_from(Json(json).respond_to(req)?)
        .status(status)
        .ok()
}

/// Timestamps are stored without a zone and always mean UTC.
pub fn serialize_date<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = date.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true);
    serializer.serialize_str(&s)
}
