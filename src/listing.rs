//! Filtering, sorting and pagination for the article and comment listings.
//!
//! Sort columns and directions are chosen from fixed sets and spliced into
//! the statement; everything a client types that is not one of those
//! keywords travels as a bound parameter.

use crate::article::{ArticleSummary, ListedArticle};
use crate::db::schema::topics;
use crate::types::{ApiError, BAD_REQUEST, TOPIC_NOT_FOUND};
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::{select, sql_query};
use regex::Regex;
use std::fmt::Write;
use std::str::FromStr;

pub const DEFAULT_LIMIT: i64 = 10;

lazy_static! {
    // Only the leading character is checked; anything else that is not a
    // known topic is a 404 from the lookup.
    static ref TOPIC_FILTER_RE: Regex = Regex::new(r"\A[a-z_-]").unwrap();
}

static SELECT_ARTICLE_PAGE: &str = "SELECT articles.*, \
       COUNT(comments.comment_id) AS comment_count, \
       COUNT(*) OVER () AS total_count \
  FROM articles LEFT JOIN comments ON comments.article_id = articles.article_id";

static COUNT_ARTICLES: &str = "SELECT COUNT(*) AS total_count FROM articles";

static TOPIC_FILTER: &str = " WHERE LOWER(articles.topic) = $1";

#[derive(Debug, Default, FromForm)]
pub struct PageParams {
    pub limit: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Default, FromForm)]
pub struct ArticleParams {
    pub topic: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub limit: i64,
    pub page: i64,
}

impl Pagination {
    pub fn parse(limit: Option<&str>, page: Option<&str>) -> Result<Pagination, ApiError> {
        let limit = match limit {
            Some(raw) => positive(raw)?,
            None => DEFAULT_LIMIT,
        };
        let page = match page {
            Some(raw) => positive(raw)?,
            None => 1,
        };
        Ok(Pagination { limit, page })
    }

    pub fn offset(&self) -> i64 {
        self.limit.saturating_mul(self.page - 1)
    }
}

impl PageParams {
    pub fn pagination(&self) -> Result<Pagination, ApiError> {
        Pagination::parse(self.limit.as_deref(), self.page.as_deref())
    }
}

fn positive(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ApiError::bad_request(BAD_REQUEST)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortField {
    ArticleId,
    Author,
    Title,
    Topic,
    CreatedAt,
    Votes,
    CommentCount,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            SortField::ArticleId => "articles.article_id",
            SortField::Author => "articles.author",
            SortField::Title => "articles.title",
            SortField::Topic => "articles.topic",
            SortField::CreatedAt => "articles.created_at",
            SortField::Votes => "articles.votes",
            SortField::CommentCount => "comment_count",
        }
    }
}

impl FromStr for SortField {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "article_id" => Ok(SortField::ArticleId),
            "author" => Ok(SortField::Author),
            "title" => Ok(SortField::Title),
            "topic" => Ok(SortField::Topic),
            "created_at" => Ok(SortField::CreatedAt),
            "votes" => Ok(SortField::Votes),
            "comment_count" => Ok(SortField::CommentCount),
            _ => Err(ApiError::bad_request("Invalid Sort Query")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ApiError::bad_request("Invalid Order Query")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<ArticleSummary>,
    #[serde(rename = "totalCount")]
    pub total_count: i64,
}

#[derive(Debug, QueryableByName)]
struct Total {
    #[diesel(sql_type = BigInt)]
    total_count: i64,
}

/// A validated request for one page of articles.
#[derive(Debug, PartialEq)]
pub struct ArticleQuery {
    pub topic: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub pagination: Pagination,
}

impl ArticleQuery {
    pub fn from_params(params: &ArticleParams) -> Result<ArticleQuery, ApiError> {
        let sort_by = match &params.sort_by {
            Some(field) => field.parse()?,
            None => SortField::CreatedAt,
        };
        let order = match &params.order {
            Some(order) => order.parse()?,
            None => SortOrder::Desc,
        };
        let topic = match params.topic.as_deref() {
            None | Some("") => None,
            Some(topic) => {
                let topic = topic.to_lowercase();
                if !TOPIC_FILTER_RE.is_match(&topic) {
                    return Err(ApiError::bad_request(BAD_REQUEST));
                }
                Some(topic)
            }
        };
        let pagination = Pagination::parse(params.limit.as_deref(), params.page.as_deref())?;
        Ok(ArticleQuery {
            topic,
            sort_by,
            order,
            pagination,
        })
    }

    /// Placeholder numbers follow the optional topic filter.
    pub fn page_sql(&self) -> String {
        let mut sql = String::from(SELECT_ARTICLE_PAGE);
        let mut next_param = 1;
        if self.topic.is_some() {
            sql.push_str(TOPIC_FILTER);
            next_param += 1;
        }
        sql.push_str(" GROUP BY articles.article_id ORDER BY ");
        let _ = write!(sql, "{} {}", self.sort_by.column(), self.order.keyword());
        if self.sort_by != SortField::ArticleId {
            sql.push_str(", articles.article_id ASC");
        }
        let _ = write!(sql, " LIMIT ${} OFFSET ${}", next_param, next_param + 1);
        sql
    }

    pub fn count_sql(&self) -> String {
        let mut sql = String::from(COUNT_ARTICLES);
        if self.topic.is_some() {
            sql.push_str(TOPIC_FILTER);
        }
        sql
    }

    pub fn load(&self, connection: &mut PgConnection) -> Result<ArticlePage, ApiError> {
        let mut query = sql_query(self.page_sql()).into_boxed::<Pg>();
        if let Some(topic) = &self.topic {
            query = query.bind::<Text, _>(topic.clone());
        }
        let rows = query
            .bind::<BigInt, _>(self.pagination.limit)
            .bind::<BigInt, _>(self.pagination.offset())
            .load::<ListedArticle>(connection)?;

        // The window count rides along on every row, so an empty page needs
        // its own count.
        let total_count = match rows.first() {
            Some(row) => row.total_count,
            None => self.count(connection)?,
        };
        if total_count == 0 {
            if let Some(topic) = &self.topic {
                let known = select(exists(topics::table.filter(topics::slug.eq(topic))))
                    .get_result::<bool>(connection)?;
                if !known {
                    return Err(ApiError::not_found(TOPIC_NOT_FOUND));
                }
            }
        }

        Ok(ArticlePage {
            articles: rows.into_iter().map(|row| row.summary).collect(),
            total_count,
        })
    }

    fn count(&self, connection: &mut PgConnection) -> Result<i64, ApiError> {
        let mut query = sql_query(self.count_sql()).into_boxed::<Pg>();
        if let Some(topic) = &self.topic {
            query = query.bind::<Text, _>(topic.clone());
        }
        Ok(query.get_result::<Total>(connection)?.total_count)
    }
}
