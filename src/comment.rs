use crate::article::Article;
use crate::db::schema::comments;
use crate::db::DbConnection;
use crate::listing::{PageParams, Pagination};
use crate::types::*;
use crate::utils::serialize_date;
use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::{delete as diesel_delete, insert_into, select, update as diesel_update};
use rocket::response::status::{Created, NoContent};
use rocket::serde::json::Json;
use serde_json::Value;

#[derive(Debug, Queryable, Serialize)]
pub struct Comment {
    pub comment_id: i32,
    pub body: String,
    pub article_id: i32,
    pub author: String,
    pub votes: i32,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
}

impl Comment {
    pub fn load_for_article(
        article_id: i32,
        pagination: Pagination,
        connection: &mut PgConnection,
    ) -> Result<Vec<Comment>, ApiError> {
        Article::ensure_exists(article_id, connection)?;
        let comments = comments::table
            .filter(comments::article_id.eq(article_id))
            .order((comments::created_at.desc(), comments::comment_id.desc()))
            .limit(pagination.limit)
            .offset(pagination.offset())
            .load::<Comment>(connection)?;
        Ok(comments)
    }

    pub fn add_votes(id: i32, delta: i32, connection: &mut PgConnection) -> Result<Comment, ApiError> {
        diesel_update(comments::table.find(id))
            .set(comments::votes.eq(comments::votes + delta))
            .get_result::<Comment>(connection)
            .optional()?
            .ok_or_else(|| ApiError::not_found(COMMENT_NOT_FOUND))
    }

    pub fn delete(id: i32, connection: &mut PgConnection) -> Result<(), ApiError> {
        let found = select(exists(comments::table.find(id))).get_result::<bool>(connection)?;
        if !found {
            return Err(ApiError::not_found(COMMENT_NOT_FOUND));
        }
        diesel_delete(comments::table.find(id)).execute(connection)?;
        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    article_id: i32,
    author: String,
    body: String,
    votes: i32,
    created_at: NaiveDateTime,
}

/// The author and text of a comment; the article comes from the path.
#[derive(Debug, PartialEq)]
pub struct CommentDetails {
    username: String,
    body: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    username: Option<Value>,
    body: Option<Value>,
}

impl Validate for CommentBody {
    type Valid = CommentDetails;
    fn validate(self) -> Result<CommentDetails, ApiError> {
        match (string_value(self.username), string_value(self.body)) {
            (Some(username), Some(body)) => Ok(CommentDetails { username, body }),
            _ => Err(ApiError::bad_request(
                "Username And Body Are Required To Be Strings",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentContainer<T> {
    comment: T,
}

#[derive(Debug, Serialize)]
pub struct CommentsContainer<T> {
    comments: T,
}

#[get("/<article_id>/comments?<params..>")]
pub fn list_for_article(
    mut conn: DbConnection,
    article_id: &str,
    params: PageParams,
) -> ApiResult<CommentsContainer<Vec<Comment>>> {
    let id = parse_id(article_id)?;
    let pagination = params.pagination()?;
    let comments = Comment::load_for_article(id, pagination, &mut conn)?;
    Ok(Json(CommentsContainer { comments }))
}

#[post("/<article_id>/comments", data = "<details>")]
pub fn add(
    mut conn: DbConnection,
    article_id: &str,
    details: JsonBody<CommentBody>,
) -> Result<Created<Json<CommentContainer<Comment>>>, ApiError> {
    let article_id = parse_id(article_id)?;
    let details = validated(details)?;
    let new_comment = NewComment {
        article_id,
        author: details.username,
        body: details.body,
        votes: 0,
        created_at: Utc::now().naive_utc(),
    };

    let comment = insert_into(comments::table)
        .values(&new_comment)
        .get_result::<Comment>(&mut *conn)?;
    let location = format!("/api/comments/{}", comment.comment_id);
    Ok(Created::new(location).body(Json(CommentContainer { comment })))
}

#[get("/")]
pub fn list(mut conn: DbConnection) -> ApiResult<CommentsContainer<Vec<Comment>>> {
    let comments = comments::table
        .order((comments::created_at.desc(), comments::comment_id.desc()))
        .load::<Comment>(&mut *conn)?;
    Ok(Json(CommentsContainer { comments }))
}

#[patch("/<comment_id>", data = "<change>")]
pub fn vote(
    mut conn: DbConnection,
    comment_id: &str,
    change: JsonBody<VoteChange>,
) -> ApiResult<CommentContainer<Comment>> {
    let id = parse_id(comment_id)?;
    let delta = validated(change)?;
    let comment = Comment::add_votes(id, delta, &mut conn)?;
    Ok(Json(CommentContainer { comment }))
}

#[delete("/<comment_id>")]
pub fn delete(mut conn: DbConnection, comment_id: &str) -> Result<NoContent, ApiError> {
    let id = parse_id(comment_id)?;
    Comment::delete(id, &mut conn)?;
    Ok(NoContent)
}
