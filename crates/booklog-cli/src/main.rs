use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use booklog_core::{seed_demo_data, AppConfig, BookFilter, CoverStore, Database, Role, SeedReport};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "booklog",
    about = "Book catalog and review server",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting BOOKLOG_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Insert demo data before serving.
        #[arg(long)]
        seed: bool,
    },

    /// Insert the demo users, books and comments (idempotent).
    Seed,

    /// Account management.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Book catalog queries.
    Book {
        #[command(subcommand)]
        action: BookAction,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account with any role, including Admin.
    Create {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Reader")]
        role: String,
    },
    /// List all accounts.
    List,
    /// Change the role of an account.
    Role { username: String, role: String },
}

#[derive(Subcommand)]
enum BookAction {
    /// List books, hidden ones included.
    List {
        /// Substring of title or author.
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        genre: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective config.
    List,
    /// Print the config file path.
    Path,
    /// Write the effective config to the config file.
    Init,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing();

    let json_output = cli.json || std::env::var("BOOKLOG_JSON").as_deref() == Ok("1");
    let mut config = AppConfig::load()?;

    match cli.command {
        Commands::Serve { host, port, seed } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.seed.demo_data |= seed;
            tracing::info!(addr = %config.bind_address(), seed = config.seed.demo_data, "starting server");

            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(booklog_server::serve(config))?;
        }

        Commands::Seed => {
            let report = run_seed(&config)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "users_created": report.users_created,
                        "books_created": report.books_created,
                        "comments_created": report.comments_created,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if report.is_empty() {
                println!("Demo data already present.");
            } else {
                println!(
                    "Seeded {} users, {} books, {} comments.",
                    report.users_created, report.books_created, report.comments_created
                );
            }
        }

        Commands::User { action } => match action {
            UserAction::Create { username, password, role } => {
                let role = parse_role(&role, json_output)?;
                let db = open_db(&config)?;
                let user = db.create_user(&username, &password, role)?;
                let dur = start.elapsed().as_millis();
                tracing::info!(user_id = user.id, role = %user.role, "user created");

                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":user,"meta":{"duration_ms":dur}}))?;
                } else {
                    println!("Created {} ({}) with id {}", user.username, user.role, user.id);
                }
            }

            UserAction::List => {
                let db = open_db(&config)?;
                let users = db.list_users()?;
                let dur = start.elapsed().as_millis();

                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "items": users, "total": users.len() },
                        "meta": { "duration_ms": dur }
                    }))?;
                } else if users.is_empty() {
                    println!("No users. Use `booklog user create` or `booklog seed`.");
                } else {
                    for user in &users {
                        println!("{:>5}  {:<30}  {}", user.id, user.username, user.role);
                    }
                }
            }

            UserAction::Role { username, role } => {
                let role = parse_role(&role, json_output)?;
                let db = open_db(&config)?;
                let user = match db.set_user_role(&username, role) {
                    Ok(user) => user,
                    Err(e) if e.is_not_found() => {
                        if json_output {
                            print_json(&serde_json::json!({"status":"error","error":"not_found","message":e.to_string()}))?;
                        } else {
                            eprintln!("User not found: {username}");
                        }
                        std::process::exit(2);
                    }
                    Err(e) => return Err(e.into()),
                };
                let dur = start.elapsed().as_millis();
                tracing::info!(user_id = user.id, role = %user.role, "user role changed");

                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":user,"meta":{"duration_ms":dur}}))?;
                } else {
                    println!("{} is now {}", user.username, user.role);
                }
            }
        },

        Commands::Book { action } => match action {
            BookAction::List { query, genre } => {
                let mut filter = BookFilter::default();
                if let Some(q) = query {
                    filter = filter.with_query(q);
                }
                if let Some(g) = genre {
                    filter = filter.with_genre(g);
                }

                let db = open_db(&config)?;
                let admin = booklog_core::Actor::new(0, Role::Admin);
                let books = db.list_books(Some(&admin), &filter)?;
                let dur = start.elapsed().as_millis();

                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "items": books, "total": books.len() },
                        "meta": { "duration_ms": dur }
                    }))?;
                } else if books.is_empty() {
                    println!("No books found.");
                } else {
                    for book in &books {
                        let genre = book.genre.as_deref().unwrap_or("-");
                        println!(
                            "{:>5}  {:<40}  {:<25}  {:<16}  {}",
                            book.id, book.title, book.author_name, genre, book.status
                        );
                    }
                }
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::List => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                    println!();
                    println!("# database_path = {}", config.database_path().display());
                    println!("# uploads_dir   = {}", config.uploads_dir().display());
                }
            }
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "path": path, "exists": path.exists() }
                    }))?;
                } else {
                    println!("{}", path.display());
                }
            }
            ConfigAction::Init => {
                let path = AppConfig::config_path();
                config.save_to(&path)?;
                tracing::info!(path = %path.display(), "config written");
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                } else {
                    println!("Wrote {}", path.display());
                }
            }
        },

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("booklog v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("booklog=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn parse_role(raw: &str, json_output: bool) -> Result<Role> {
    match raw.parse::<Role>() {
        Ok(role) => Ok(role),
        Err(msg) => {
            if json_output {
                print_json(&serde_json::json!({"status":"error","error":"invalid_role","message":msg}))?;
            } else {
                eprintln!("{msg} (expected Admin, Author or Reader)");
            }
            std::process::exit(2);
        }
    }
}

fn open_db(config: &AppConfig) -> Result<Database> {
    let db_path = config.database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;
    Ok(db.with_password_cost(config.auth.bcrypt_cost))
}

fn run_seed(config: &AppConfig) -> Result<SeedReport> {
    let db = open_db(config)?;
    let covers = CoverStore::new(config.uploads_dir());
    let report = seed_demo_data(&db, Some(&covers))?;
    tracing::info!(
        users = report.users_created,
        books = report.books_created,
        comments = report.comments_created,
        db = %config.database_path().display(),
        "seed command finished"
    );
    Ok(report)
}
