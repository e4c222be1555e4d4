use anyhow::{anyhow, Result};
use std::env;
use std::io;
use std::path::Path;
use work_schedule_bot::config::database_url_from_env;
use work_schedule_bot::database::connection::DatabaseManager;

#[tokio::main]
async fn main() -> Result<()> {
    // sqlx reports through `log`
    env_logger::init();
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

fn sqlite_path(database_url: &str) -> Option<&str> {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
}

async fn run_migrations() -> Result<()> {
    println!("🔧 Work Schedule Bot - Database Migration Tool");
    println!("==============================================");

    let database_url = database_url_from_env();
    println!("📊 Database URL: {}", mask_url(&database_url));

    if let Some(parent) = sqlite_path(&database_url).and_then(|path| Path::new(path).parent()) {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            println!("📁 Creating directory: {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }

    println!("🚀 Running database migrations...");

    let db_manager = DatabaseManager::new(&database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    if let Err(e) = db_manager.run_migrations().await {
        eprintln!("❌ Migration failed: {e}");
        std::process::exit(1);
    }

    println!("✅ Migrations completed successfully!");
    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");

    let database_url = database_url_from_env();
    println!("📊 Database URL: {}", mask_url(&database_url));

    let db_manager = DatabaseManager::new(&database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match check_tables(&db_manager).await {
        Ok(tables) if tables.is_empty() => {
            println!("⚠️  Database is empty");
            println!("💡 Try running 'migrate up' to create the schema");
        }
        Ok(tables) => {
            println!("✅ Database connection successful!");
            println!("📋 Found tables:");
            for (table, rows) in tables {
                println!("  • {table} ({rows} rows)");
            }
        }
        Err(e) => {
            println!("⚠️  Database check failed: {e}");
            println!("💡 Try running 'migrate up' to create the schema");
        }
    }

    Ok(())
}

async fn reset_database() -> Result<()> {
    let database_url = database_url_from_env();
    let db_path = sqlite_path(&database_url)
        .ok_or_else(|| anyhow!("Reset is only supported for SQLite databases"))?;

    println!("⚠️  WARNING: This will delete ALL attendance data in {}!", mask_url(&database_url));
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    if Path::new(db_path).exists() {
        std::fs::remove_file(db_path)?;
        println!("🗑️  Deleted database file: {db_path}");
    }

    println!("🔄 Recreating database schema...");
    run_migrations().await?;

    println!("✅ Database reset completed!");
    Ok(())
}

async fn check_tables(db_manager: &DatabaseManager) -> Result<Vec<(String, i64)>> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%'
         ORDER BY name",
    )
    .fetch_all(&db_manager.pool)
    .await?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{}\"", name))
            .fetch_one(&db_manager.pool)
            .await?;
        tables.push((name, count));
    }
    Ok(tables)
}

fn mask_url(url: &str) -> String {
    match sqlite_path(url).and_then(|path| Path::new(path).file_name()) {
        Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
        None => url.to_string(),
    }
}

fn print_help() {
    println!("🗓️  Work Schedule Bot - Database Migration Tool");
    println!();
    println!("USAGE:");
    println!("    migrate [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    migrate, up    Run database migrations (default)");
    println!("    check          List tables and row counts");
    println!("    reset          Reset database (SQLite only) - DESTRUCTIVE!");
    println!("    help           Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    DATABASE_URL   Database connection string (default: sqlite:./data/worktime.db)");
    println!();
}
