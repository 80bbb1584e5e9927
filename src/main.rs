#[macro_use]
extern crate rocket;

#[macro_use]
extern crate error_chain;

#[macro_use]
extern crate diesel;
extern crate r2d2;

extern crate chrono;
extern crate dotenv;
extern crate env_logger;
#[macro_use]
extern crate lazy_static;
extern crate log;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

mod article;
mod comment;
mod db;
mod listing;
mod topic;
mod types;
mod users;
mod utils;

use log::error;
use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::{Json, Value};
use rocket::{Build, Rocket};

#[catch(404)]
fn not_found(_req: &Request) -> Json<Value> {
    Json(json!({ "msg": "Non existent endpoint" }))
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> Json<Value> {
    let msg = status.reason().unwrap_or("Unexpected Error");
    Json(json!({ "msg": msg }))
}

/// Describes every endpoint the server exposes.
#[get("/")]
fn endpoints() -> Json<Value> {
    Json(json!({ "endpoints": {
        "GET /api": {
            "description": "serves this description of every endpoint"
        },
        "GET /api/topics": {
            "description": "serves an array of all topics",
            "exampleResponse": { "topics": [{ "slug": "football", "description": "Footie!" }] }
        },
        "POST /api/topics": {
            "description": "adds a topic",
            "exampleRequest": { "slug": "football", "description": "Footie!" }
        },
        "GET /api/articles": {
            "description": "serves a page of articles with their comment counts",
            "queries": ["topic", "sort_by", "order", "limit", "page"],
            "exampleResponse": { "articles": [], "totalCount": 0 }
        },
        "POST /api/articles": {
            "description": "adds an article",
            "exampleRequest": {
                "author": "butter_bridge",
                "title": "Seafood substitutions are increasing",
                "body": "Text from the article..",
                "topic": "cooking",
                "article_img_url": "https://example.com/image.jpg"
            }
        },
        "GET /api/articles/:article_id": {
            "description": "serves one article with its comment count"
        },
        "PATCH /api/articles/:article_id": {
            "description": "changes an article's votes by inc_votes",
            "exampleRequest": { "inc_votes": 1 }
        },
        "DELETE /api/articles/:article_id": {
            "description": "deletes an article and its comments"
        },
        "GET /api/articles/:article_id/comments": {
            "description": "serves a page of an article's comments, newest first",
            "queries": ["limit", "page"]
        },
        "POST /api/articles/:article_id/comments": {
            "description": "adds a comment to an article",
            "exampleRequest": { "username": "butter_bridge", "body": "Great read" }
        },
        "GET /api/comments": {
            "description": "serves every comment, newest first"
        },
        "PATCH /api/comments/:comment_id": {
            "description": "changes a comment's votes by inc_votes",
            "exampleRequest": { "inc_votes": -1 }
        },
        "DELETE /api/comments/:comment_id": {
            "description": "deletes a comment"
        },
        "GET /api/users": {
            "description": "serves an array of all users"
        },
        "GET /api/users/:username": {
            "description": "serves one user"
        }
    }}))
}

pub fn server(pool: db::Pool) -> Rocket<Build> {
    rocket::build()
        .manage(pool)
        .mount("/api", routes![endpoints])
        .mount("/api/topics", routes![topic::list, topic::create])
        .mount(
            "/api/articles",
            routes![
                article::list,
                article::get,
                article::create,
                article::vote,
                article::delete,
                comment::list_for_article,
                comment::add
            ],
        )
        .mount(
            "/api/comments",
            routes![comment::list, comment::vote, comment::delete],
        )
        .mount("/api/users", routes![users::list, users::get])
        .register("/", catchers![not_found, default_catcher])
}

#[rocket::main]
async fn main() {
    env_logger::init();
    let pool = match db::init_pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = server(pool).launch().await {
        error!("server stopped: {}", e);
        std::process::exit(1);
    }
}
