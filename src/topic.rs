use crate::db::schema::topics;
use crate::db::DbConnection;
use crate::types::*;
use diesel::insert_into;
use diesel::prelude::*;
use regex::Regex;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use serde_json::Value;

lazy_static! {
    static ref SLUG_RE: Regex = {
        let pattern = r"\A[a-z_-][a-z0-9_-]*\z";
        Regex::new(pattern).unwrap()
    };
}

pub fn is_slug(candidate: &str) -> bool {
    SLUG_RE.is_match(candidate)
}

#[derive(Debug, Queryable, Insertable, Serialize, PartialEq)]
#[diesel(table_name = topics)]
pub struct Topic {
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TopicContainer<T> {
    topic: T,
}

#[derive(Debug, Serialize)]
pub struct TopicsContainer<T> {
    topics: T,
}

#[derive(Debug, Deserialize)]
pub struct CreateTopic {
    slug: Option<Value>,
    description: Option<Value>,
}

impl Validate for CreateTopic {
    type Valid = Topic;
    fn validate(self) -> Result<Topic, ApiError> {
        match (Field::from(self.slug), Field::from(self.description)) {
            (Field::Text(slug), Field::Text(description)) => {
                if !is_slug(&slug) {
                    return Err(ApiError::bad_request(BAD_REQUEST));
                }
                Ok(Topic { slug, description })
            }
            (Field::Missing, _) | (_, Field::Missing) => Err(ApiError::bad_request(
                "topics must contain: slug and description",
            )),
            _ => Err(ApiError::bad_request("all input values must be strings")),
        }
    }
}

#[get("/")]
pub fn list(mut conn: DbConnection) -> ApiResult<TopicsContainer<Vec<Topic>>> {
    let topics = topics::table
        .order(topics::slug.asc())
        .load::<Topic>(&mut *conn)?;
    Ok(Json(TopicsContainer { topics }))
}

#[post("/", data = "<details>")]
pub fn create(
    mut conn: DbConnection,
    details: JsonBody<CreateTopic>,
) -> Result<Created<Json<TopicContainer<Topic>>>, ApiError> {
    let new_topic = validated(details)?;
    let topic = insert_into(topics::table)
        .values(&new_topic)
        .get_result::<Topic>(&mut *conn)?;
    Ok(Created::new("/api/topics").body(Json(TopicContainer { topic })))
}
