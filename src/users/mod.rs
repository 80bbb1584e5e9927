use crate::db::DbConnection;
use crate::types::ApiResult;
use rocket::serde::json::Json;

pub mod models;

use self::models::User;

#[derive(Debug, Serialize)]
pub struct UserContainer<T> {
    user: T,
}

#[derive(Debug, Serialize)]
pub struct UsersContainer<T> {
    users: T,
}

#[get("/")]
pub fn list(mut conn: DbConnection) -> ApiResult<UsersContainer<Vec<User>>> {
    let users = User::load_all(&mut conn)?;
    Ok(Json(UsersContainer { users }))
}

#[get("/<username>")]
pub fn get(mut conn: DbConnection, username: &str) -> ApiResult<UserContainer<User>> {
    let user = User::load_by_name(username, &mut conn)?;
    Ok(Json(UserContainer { user }))
}

#[cfg(test)]
mod tests {
    use crate::db::testing;
    use rocket::http::Status;
    use serde_json::Value;

    #[test]
    fn lists_users() {
        let Some(client) = testing::client() else { return };
        let response = client.get("/api/users").dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_json::<Value>().unwrap();
        let users = body["users"].as_array().unwrap();
        assert_eq!(users.len(), 4);
        for user in users {
            assert!(user["username"].is_string());
            assert!(user["name"].is_string());
            assert!(user["avatar_url"].is_string());
        }
    }

    #[test]
    fn finds_a_user_by_username() {
        let Some(client) = testing::client() else { return };
        let response = client.get("/api/users/butter_bridge").dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_json::<Value>().unwrap();
        assert_eq!(body["user"]["username"], "butter_bridge");
        assert_eq!(body["user"]["name"], "jonny");
    }

    #[test]
    fn unknown_username_is_not_found() {
        let Some(client) = testing::client() else { return };
        let response = client.get("/api/users/ghost").dispatch();
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(
            response.into_json::<Value>().unwrap()["msg"],
            "No User With That Username Can Be Found"
        );
    }
}
