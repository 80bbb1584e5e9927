use crate::db::schema::{articles, comments};
use crate::db::DbConnection;
use crate::listing::{ArticlePage, ArticleParams, ArticleQuery};
use crate::types::*;
use crate::utils::serialize_date;
use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use diesel::{delete as diesel_delete, insert_into, select, sql_query, update as diesel_update};
use rocket::response::status::{Created, NoContent};
use rocket::serde::json::Json;
use serde_json::Value;

static SELECT_ARTICLE_WITH_COUNT: &str = "SELECT articles.*, \
       COUNT(comments.comment_id) AS comment_count \
  FROM articles LEFT JOIN comments ON comments.article_id = articles.article_id \
 WHERE articles.article_id = $1 \
 GROUP BY articles.article_id";

#[derive(Debug, Queryable, QueryableByName, Serialize)]
#[diesel(table_name = articles)]
pub struct Article {
    pub article_id: i32,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    pub votes: i32,
    pub article_img_url: String,
}

/// An article together with the number of comments left on it.
#[derive(Debug, QueryableByName, Serialize)]
pub struct ArticleSummary {
    #[diesel(embed)]
    #[serde(flatten)]
    pub article: Article,
    #[diesel(sql_type = BigInt)]
    pub comment_count: i64,
}

/// One row of a listing page, carrying the size of the whole filtered set.
#[derive(Debug, QueryableByName)]
pub struct ListedArticle {
    #[diesel(embed)]
    pub summary: ArticleSummary,
    #[diesel(sql_type = BigInt)]
    pub total_count: i64,
}

impl Article {
    pub fn ensure_exists(id: i32, connection: &mut PgConnection) -> Result<(), ApiError> {
        let found = select(exists(articles::table.find(id))).get_result::<bool>(connection)?;
        if found {
            Ok(())
        } else {
            Err(ApiError::not_found(ARTICLE_NOT_FOUND))
        }
    }

    /// Applies a relative vote change in a single statement.
    pub fn add_votes(id: i32, delta: i32, connection: &mut PgConnection) -> Result<Article, ApiError> {
        diesel_update(articles::table.find(id))
            .set(articles::votes.eq(articles::votes + delta))
            .get_result::<Article>(connection)
            .optional()?
            .ok_or_else(|| ApiError::not_found(ARTICLE_NOT_FOUND))
    }

    /// Removes the article and every comment left on it.
    pub fn delete(id: i32, connection: &mut PgConnection) -> Result<(), ApiError> {
        connection.transaction::<_, ApiError, _>(|conn| {
            Article::ensure_exists(id, conn)?;
            diesel_delete(comments::table.filter(comments::article_id.eq(id))).execute(conn)?;
            diesel_delete(articles::table.find(id)).execute(conn)?;
            Ok(())
        })
    }
}

impl ArticleSummary {
    pub fn load(id: i32, connection: &mut PgConnection) -> Result<ArticleSummary, ApiError> {
        sql_query(SELECT_ARTICLE_WITH_COUNT)
            .bind::<Integer, _>(id)
            .get_result::<ArticleSummary>(connection)
            .optional()?
            .ok_or_else(|| ApiError::not_found(ARTICLE_NOT_FOUND))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = articles)]
pub struct NewArticle {
    author: String,
    title: String,
    body: String,
    topic: String,
    article_img_url: String,
    created_at: NaiveDateTime,
    votes: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticle {
    author: Option<Value>,
    title: Option<Value>,
    body: Option<Value>,
    topic: Option<Value>,
    article_img_url: Option<Value>,
}

impl Validate for CreateArticle {
    type Valid = NewArticle;
    fn validate(self) -> Result<NewArticle, ApiError> {
        let required = [
            Field::from(self.author),
            Field::from(self.title),
            Field::from(self.body),
            Field::from(self.topic),
        ];
        if required.iter().any(|field| *field == Field::Missing) {
            return Err(ApiError::bad_request(
                "articles must contain: author, title, body & topic",
            ));
        }
        match (required, string_value(self.article_img_url)) {
            (
                [Field::Text(author), Field::Text(title), Field::Text(body), Field::Text(topic)],
                Some(article_img_url),
            ) => Ok(NewArticle {
                author,
                title,
                body,
                topic,
                article_img_url,
                created_at: Utc::now().naive_utc(),
                votes: 0,
            }),
            _ => Err(ApiError::bad_request("all input values must be strings")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleContainer<T> {
    article: T,
}

#[get("/?<params..>")]
pub fn list(mut conn: DbConnection, params: ArticleParams) -> ApiResult<ArticlePage> {
    let query = ArticleQuery::from_params(&params)?;
    Ok(Json(query.load(&mut conn)?))
}

#[get("/<article_id>")]
pub fn get(mut conn: DbConnection, article_id: &str) -> ApiResult<ArticleContainer<ArticleSummary>> {
    let id = parse_id(article_id)?;
    let article = ArticleSummary::load(id, &mut conn)?;
    Ok(Json(ArticleContainer { article }))
}

#[post("/", data = "<create>")]
pub fn create(
    mut conn: DbConnection,
    create: JsonBody<CreateArticle>,
) -> Result<Created<Json<ArticleContainer<ArticleSummary>>>, ApiError> {
    let new_article = validated(create)?;
    let article = insert_into(articles::table)
        .values(&new_article)
        .get_result::<Article>(&mut *conn)?;
    let location = format!("/api/articles/{}", article.article_id);
    let article = ArticleSummary {
        article,
        comment_count: 0,
    };
    Ok(Created::new(location).body(Json(ArticleContainer { article })))
}

#[patch("/<article_id>", data = "<change>")]
pub fn vote(
    mut conn: DbConnection,
    article_id: &str,
    change: JsonBody<VoteChange>,
) -> ApiResult<ArticleContainer<Article>> {
    let id = parse_id(article_id)?;
    let delta = validated(change)?;
    let article = Article::add_votes(id, delta, &mut conn)?;
    Ok(Json(ArticleContainer { article }))
}

#[delete("/<article_id>")]
pub fn delete(mut conn: DbConnection, article_id: &str) -> Result<NoContent, ApiError> {
    let id = parse_id(article_id)?;
    Article::delete(id, &mut conn)?;
    Ok(NoContent)
}
