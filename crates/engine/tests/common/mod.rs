#![allow(dead_code)]

use std::path::PathBuf;

use engine::{Actor, Currency, Engine, NewProfileCmd, Profile, Role};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

pub async fn engine() -> Engine {
    engine_on(database().await, Currency::Omr).await
}

/// Migrated in-memory database, shareable between engines.
pub async fn database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_on(db: DatabaseConnection, currency: Currency) -> Engine {
    Engine::builder()
        .database(db)
        .currency(currency)
        .build()
        .await
        .unwrap()
}

/// SQLite file removed again on drop.
pub struct TempDb {
    pub path: PathBuf,
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Engine over a file database with a pool of several connections, so
/// concurrent operations run on separate connections.
pub async fn pooled_engine() -> (Engine, TempDb) {
    let temp = TempDb {
        path: std::env::temp_dir().join(format!("bursar-{}.db", Uuid::new_v4())),
    };
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", temp.path.display()));
    options.max_connections(8).min_connections(2);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    (engine_on(db, Currency::Omr).await, temp)
}

pub async fn profile(engine: &Engine, name: &str, role: Role) -> Profile {
    engine
        .create_profile(&Actor::system(), NewProfileCmd::new(name, role))
        .await
        .unwrap()
}

/// Creates a profile with `role` and returns the actor acting as it.
pub async fn actor(engine: &Engine, name: &str, role: Role) -> Actor {
    let profile = profile(engine, name, role).await;
    Actor::new(name, profile.id, role)
}
