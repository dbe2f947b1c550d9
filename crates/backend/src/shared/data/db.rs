use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use std::path::Path;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Tables written by the external sync jobs and read by the analytics core.
/// Derived calendar fields are filled in at ingestion.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_appointment (
        id TEXT PRIMARY KEY NOT NULL,
        customer_email TEXT NOT NULL,
        scheduled_at TEXT NOT NULL,
        store_city TEXT NOT NULL,
        category TEXT NOT NULL,
        is_cancelled INTEGER NOT NULL DEFAULT 0,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL,
        day_of_week INTEGER NOT NULL,
        hour INTEGER NOT NULL,
        local_date TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a001_year_month ON a001_appointment (year, month);",
    "CREATE INDEX IF NOT EXISTS idx_a001_local_date ON a001_appointment (local_date);",
    "CREATE INDEX IF NOT EXISTS idx_a001_customer ON a001_appointment (customer_email, scheduled_at);",
    r#"
    CREATE TABLE IF NOT EXISTS a002_commerce_order (
        id TEXT PRIMARY KEY NOT NULL,
        customer_email TEXT,
        created_at TEXT NOT NULL,
        tags_json TEXT NOT NULL DEFAULT '[]',
        total_price REAL NOT NULL DEFAULT 0
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a002_created_at ON a002_commerce_order (created_at);",
];

pub async fn initialize_database(db_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database at {}", absolute_path.display());
    let conn = Database::connect(&db_url).await?;
    ensure_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("database already initialized"))?;
    Ok(())
}

/// Create the analytics tables if they are missing
pub async fn ensure_schema(conn: &DatabaseConnection) -> Result<(), DbErr> {
    for sql in SCHEMA {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await?;
    }
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

/// Fresh in-memory database with the schema applied.
/// A single pooled connection keeps every query on the same memory database.
#[cfg(test)]
pub async fn connect_in_memory() -> DatabaseConnection {
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = Database::connect(options).await.unwrap();
    ensure_schema(&conn).await.unwrap();
    conn
}
