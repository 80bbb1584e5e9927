use crate::db::schema::users;
use crate::types::{ApiError, USER_NOT_FOUND};
use diesel::prelude::*;

#[derive(Debug, Queryable, Serialize)]
pub struct User {
    pub username: String,
    pub name: String,
    pub avatar_url: String,
}

impl User {
    pub fn load_all(connection: &mut PgConnection) -> Result<Vec<User>, ApiError> {
        users::table
            .order(users::username.asc())
            .load::<User>(connection)
            .map_err(|e| e.into())
    }

    pub fn load_by_name(name: &str, connection: &mut PgConnection) -> Result<User, ApiError> {
        users::table
            .find(name)
            .get_result::<User>(connection)
            .optional()?
            .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
    }
}
