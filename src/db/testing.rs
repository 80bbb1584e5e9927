//! Disposable databases for handler tests.
//!
//! Every client gets a pool holding a single connection that never commits:
//! the tables are session-local temporaries created inside a test
//! transaction, so tests can run side by side against the same server.

use super::Pool;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Error as PoolError};
use diesel::Connection;
use dotenv::dotenv;
use log::warn;
use rocket::local::blocking::Client;
use std::env;

static SCHEMA: &str = "
CREATE TEMPORARY TABLE topics (
    slug VARCHAR PRIMARY KEY,
    description VARCHAR NOT NULL
);
CREATE TEMPORARY TABLE users (
    username VARCHAR PRIMARY KEY,
    name VARCHAR NOT NULL,
    avatar_url VARCHAR NOT NULL
);
CREATE TEMPORARY TABLE articles (
    article_id SERIAL PRIMARY KEY,
    title VARCHAR NOT NULL,
    topic VARCHAR NOT NULL REFERENCES topics(slug),
    author VARCHAR NOT NULL REFERENCES users(username),
    body VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    votes INT NOT NULL DEFAULT 0,
    article_img_url VARCHAR NOT NULL
);
CREATE TEMPORARY TABLE comments (
    comment_id SERIAL PRIMARY KEY,
    body VARCHAR NOT NULL,
    article_id INT NOT NULL REFERENCES articles(article_id),
    author VARCHAR NOT NULL REFERENCES users(username),
    votes INT NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

// Thirteen articles, twelve about mitch and one about cats; nobody has
// written about paper yet. Comments: 11 on article 1, 2 each on articles
// 3, 5 and 9, 1 on article 6.
static SEED: &str = "
INSERT INTO topics (slug, description) VALUES
    ('mitch', 'The man, the Mitch, the legend'),
    ('cats', 'Not dogs'),
    ('paper', 'what books are made of');

INSERT INTO users (username, name, avatar_url) VALUES
    ('butter_bridge', 'jonny', 'https://example.com/avatars/butter_bridge.jpg'),
    ('icellusedkars', 'sam', 'https://example.com/avatars/icellusedkars.jpg'),
    ('rogersop', 'paul', 'https://example.com/avatars/rogersop.jpg'),
    ('lurker', 'do_nothing', 'https://example.com/avatars/lurker.jpg');

INSERT INTO articles (title, topic, author, body, created_at, votes, article_img_url) VALUES
    ('Living in the shadow of a great man', 'mitch', 'butter_bridge', 'I find this existence challenging', '2020-07-09 20:11:00', 100, 'https://example.com/1.jpg'),
    ('Sony Vaio; or, The Laptop', 'mitch', 'icellusedkars', 'Call me Mitchell.', '2020-10-16 05:03:00', 0, 'https://example.com/2.jpg'),
    ('Eight pug gifs that remind me of mitch', 'mitch', 'icellusedkars', 'some gifs', '2020-11-03 09:12:00', 0, 'https://example.com/3.jpg'),
    ('Student SUES Mitch!', 'mitch', 'rogersop', 'We all love Mitch and his wonderful, unique typing style.', '2020-05-06 01:14:00', 0, 'https://example.com/4.jpg'),
    ('UNCOVERED: catspiracy to bring down democracy', 'cats', 'rogersop', 'Bastet walks amongst us, and the cats are taking arms!', '2020-08-03 13:14:00', 0, 'https://example.com/5.jpg'),
    ('A', 'mitch', 'icellusedkars', 'Delicious tin of cat food', '2020-10-18 01:00:00', 0, 'https://example.com/6.jpg'),
    ('Z', 'mitch', 'icellusedkars', 'I was hungry.', '2020-01-07 14:08:00', 0, 'https://example.com/7.jpg'),
    ('Does Mitch predate civilisation?', 'mitch', 'icellusedkars', 'Archaeologists have uncovered a gigantic statue.', '2020-04-17 01:08:00', 0, 'https://example.com/8.jpg'),
    ('They''re not exactly dogs, are they?', 'mitch', 'butter_bridge', 'Well? Think about it.', '2020-06-06 09:10:00', 0, 'https://example.com/9.jpg'),
    ('Seven inspirational thought leaders from Manchester UK', 'mitch', 'rogersop', 'Who are we kidding, there is only one, and it''s Mitch!', '2020-05-14 04:15:00', 0, 'https://example.com/10.jpg'),
    ('Am I a cat?', 'mitch', 'icellusedkars', 'Having run out of ideas, I think I might be a cat.', '2020-01-15 22:21:00', 0, 'https://example.com/11.jpg'),
    ('Moustache', 'mitch', 'butter_bridge', 'Have you seen the size of that thing?', '2020-10-11 11:24:00', 0, 'https://example.com/12.jpg'),
    ('Another article about Mitch', 'mitch', 'butter_bridge', 'There will never be enough articles about Mitch!', '2020-10-11 11:24:00', 0, 'https://example.com/13.jpg');

INSERT INTO comments (body, article_id, author, votes, created_at)
SELECT 'Comment number ' || n, 1, 'icellusedkars', n, TIMESTAMP '2020-02-01 00:00:00' + n * INTERVAL '1 day'
  FROM generate_series(1, 11) AS n
 ORDER BY n;

INSERT INTO comments (body, article_id, author, votes, created_at) VALUES
    ('What do you see? I have no idea where this will lead us.', 9, 'butter_bridge', 16, '2020-04-06 12:17:00'),
    ('The owls are not what they seem.', 9, 'icellusedkars', 20, '2020-03-14 17:02:00'),
    ('git push origin master', 3, 'icellusedkars', 0, '2020-06-20 07:24:00'),
    ('Ambidextrous marsupial', 3, 'icellusedkars', 0, '2020-09-19 23:10:00'),
    ('I hate streaming noses', 5, 'icellusedkars', 0, '2020-11-03 21:00:00'),
    ('I hate streaming eyes even more', 5, 'icellusedkars', 0, '2020-04-11 21:02:00'),
    ('Fruit pastilles', 6, 'icellusedkars', 0, '2020-06-15 10:25:00');
";

#[derive(Debug)]
struct TestTransaction;

impl CustomizeConnection<PgConnection, PoolError> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), PoolError> {
        conn.begin_test_transaction().map_err(PoolError::QueryError)
    }
}

pub fn database_url() -> Option<String> {
    dotenv().ok();
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

/// A pool over a freshly seeded database, or `None` when no database is
/// configured for tests.
pub fn seeded_pool() -> Option<Pool> {
    let _ = env_logger::builder().is_test(true).try_init();
    let database_url = match database_url() {
        Some(url) => url,
        None => {
            warn!("neither TEST_DATABASE_URL nor DATABASE_URL is set; skipping database test");
            return None;
        }
    };

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(TestTransaction))
        .build(manager)
        .expect("test database should be reachable");
    {
        let mut conn = pool.get().expect("pool hands out its only connection");
        conn.batch_execute(SCHEMA).expect("schema is valid");
        conn.batch_execute(SEED).expect("seed data is valid");
    }
    Some(pool)
}

pub fn client() -> Option<Client> {
    let pool = seeded_pool()?;
    Some(Client::tracked(crate::server(pool)).expect("valid rocket instance"))
}
