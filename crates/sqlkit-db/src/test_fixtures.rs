//! Shared model and schema for unit tests.

use rusqlite::types::Value;
use serde::Serialize;

use crate::migrations::{Migration, Migrator};
use crate::model::Model;
use crate::pool::{init_memory_pool, DbPool};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
}

impl User {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            email: email.to_string(),
            age: None,
        }
    }
}

impl Model for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["name", "email", "age"];
    const SOFT_DELETE: Option<&'static str> = Some("is_deleted");

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            age: row.get(3)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.email.clone()),
            self.age.map_or(Value::Null, Value::Integer),
        ]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }
}

pub const USERS_UP: &str = r#"
CREATE TABLE users (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    email      TEXT NOT NULL UNIQUE,
    age        INTEGER CHECK (age IS NULL OR age >= 0),
    is_deleted INTEGER NOT NULL DEFAULT 0
);
"#;

pub const USERS_DOWN: &str = "DROP TABLE users;";

pub fn migrator() -> Migrator {
    Migrator::new(vec![Migration::new(1, "create_users", USERS_UP).with_down(USERS_DOWN)])
        .unwrap()
}

/// In-memory pool with the users table in place.
pub fn setup() -> DbPool {
    let pool = init_memory_pool().unwrap();
    let conn = pool.get().unwrap();
    migrator().upgrade(&conn, None).unwrap();
    pool
}
