use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use dotenv::dotenv;
use log::{info, warn};
use rocket::http::Status;
use rocket::outcome::{try_outcome, Outcome};
use rocket::request::{self, FromRequest};
use rocket::{Request, State};
use std::env;
use std::ops::{Deref, DerefMut};

pub mod schema;
#[cfg(test)]
pub mod testing;

const DEFAULT_POOL_SIZE: u32 = 10;

// An alias to the type for a pool of Diesel Postgres connections.
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub struct DbConnection(pub r2d2::PooledConnection<ConnectionManager<PgConnection>>);

error_chain! {
    foreign_links {
        Var(::std::env::VarError);
        PoolSize(::std::num::ParseIntError);
        R2D2(::r2d2::Error);
    }
}

/// Attempts to retrieve a single connection from the managed database pool. If
/// no pool is currently managed, fails with an `InternalServerError` status. If
/// no connections are available, fails with a `ServiceUnavailable` status.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for DbConnection {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<DbConnection, ()> {
        let pool = try_outcome!(request.guard::<&State<Pool>>().await);
        match pool.get() {
            Ok(conn) => Outcome::Success(DbConnection(conn)),
            Err(e) => {
                warn!("no database connection available: {}", e);
                Outcome::Error((Status::ServiceUnavailable, ()))
            }
        }
    }
}

// For the convenience of using a &mut DbConnection as a &mut PgConnection.
impl Deref for DbConnection {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Builds the connection pool from `DATABASE_URL` and the optional
/// `DATABASE_POOL_SIZE`, reading `.env` first when present.
pub fn init_pool() -> Result<Pool> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL")?;
    let pool_size = match env::var("DATABASE_POOL_SIZE") {
        Ok(size) => size.parse::<u32>()?,
        Err(env::VarError::NotPresent) => DEFAULT_POOL_SIZE,
        Err(e) => return Err(e.into()),
    };
    if pool_size == 0 {
        bail!("DATABASE_POOL_SIZE must be at least 1");
    }

    info!("connecting to database with a pool of {} connections", pool_size);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Ok(Pool::builder().max_size(pool_size).build(manager)?)
}
