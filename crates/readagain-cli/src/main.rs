use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use readagain_catalog::{GoogleBooksClient, PlaceholderImage, resolve_covers};
use readagain_core::analytics::{contribution_grid, reading_stats};
use readagain_core::{
    AppConfig, BookDetails, ChildRecord, Clock, ExitCode, HistoryCache, HistoryStore,
    JsonHistoryStore, ReadAgainError, ReadingSession, Recommender, SystemClock, fixtures,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "readagain",
    about = "Track children's reading and pick books worth reading again",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting READAGAIN_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the sample child and reading history into the store.
    Seed {
        /// Overwrite an existing sample child.
        #[arg(long)]
        force: bool,
    },

    /// Books worth reading again, best first.
    Recommend {
        #[arg(long)]
        child: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Look up cover images in the book catalog.
        #[arg(long)]
        covers: bool,
    },

    /// List known children.
    Children,

    /// List a child's reading history.
    History {
        #[arg(long)]
        child: Option<String>,
    },

    /// Log a reading session.
    Log {
        #[arg(long)]
        child: Option<String>,
        #[arg(long)]
        book: String,
        #[arg(long)]
        minutes: u32,
        #[arg(long, default_value = "1.0")]
        completion: f64,
        /// Child's reaction, 1-5.
        #[arg(long)]
        rating: u8,
        /// When the session happened (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<String>,
        /// Book details, needed the first time a book is logged.
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "general")]
        genre: String,
        #[arg(long, default_value = "1")]
        difficulty: u8,
        #[arg(long, action = clap::ArgAction::Append)]
        theme: Vec<String>,
    },

    /// Reading stats, streak and activity heat-map.
    Stats {
        #[arg(long)]
        child: Option<String>,
        #[arg(long, default_value = "12")]
        weeks: u32,
    },

    /// Search the book catalog.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Look one catalog volume up by id or ISBN.
    Book {
        /// Catalog volume id.
        #[arg(required_unless_present = "isbn", conflicts_with = "isbn")]
        id: Option<String>,
        #[arg(long)]
        isbn: Option<String>,
    },

    /// Print a placeholder cover as SVG.
    Placeholder {
        #[arg(long, default_value = "200")]
        width: u32,
        #[arg(long, default_value = "300")]
        height: u32,
        #[arg(long, default_value = "Placeholder")]
        text: String,
        #[arg(long, default_value = "#f3f4f6")]
        bg: String,
        #[arg(long, default_value = "#6b7280")]
        color: String,
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
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write a default config file.
    Init,
}

// ─── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("READAGAIN_JSON").as_deref() == Ok("1");

    let code = match run(cli, json_output).await {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            let code = exit_code_for(&err);
            if json_output {
                let _ = print_json(&serde_json::json!({
                    "status": "error",
                    "error": format!("{code:?}"),
                    "message": format!("{err:#}"),
                }));
            } else {
                eprintln!("Error: {err:#}");
            }
            code
        }
    };
    std::process::exit(code as i32);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<ReadAgainError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<readagain_catalog::CatalogError>().is_some() {
        return ExitCode::NetworkError;
    }
    ExitCode::GeneralError
}

async fn run(cli: Cli, json_output: bool) -> Result<()> {
    let start = Instant::now();

    let mut config = AppConfig::load()?;
    if let Ok(dir) = std::env::var("READAGAIN_DATA_DIR") {
        config.set_data_dir(dir.into());
    }

    let clock = SystemClock;
    debug!(data_dir = %config.core.data_dir, "loaded config");
    let store = Arc::new(HistoryCache::new(
        JsonHistoryStore::new(config.history_dir()),
        clock,
        config.cache.history_ttl()?,
    ));
    let child_or_default =
        |child: Option<String>| child.unwrap_or_else(|| config.core.default_child.clone());

    match cli.command {
        // ── Seed ───────────────────────────────────────────────────────────
        Commands::Seed { force } => {
            let profile = fixtures::sample_profile();
            if store.fetch_profile(&profile.id)?.is_some() && !force {
                bail!(
                    "child '{}' already exists; pass --force to overwrite",
                    profile.id
                );
            }
            let now = clock.now();
            let mut record = ChildRecord::new(profile);
            record.history = fixtures::sample_history(now);
            record.sessions = fixtures::sample_sessions(now);
            record.sessions.sort_by_key(|s| s.read_at);
            let path = store.inner().save_record(&record)?;
            store.invalidate(&record.profile.id);

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"child":record.profile.id,"books":record.history.len(),"path":path},"meta":{"duration_ms":dur}}))?;
            } else {
                println!(
                    "Seeded '{}' with {} books at {}.",
                    record.profile.name,
                    record.history.len(),
                    path.display()
                );
            }
        }

        // ── Recommend ──────────────────────────────────────────────────────
        Commands::Recommend {
            child,
            limit,
            covers,
        } => {
            let child = child_or_default(child);
            let limit = limit.unwrap_or(config.recommendations.default_limit);
            let recommender = Recommender::new(Arc::clone(&store), clock);
            let scored = recommender.recommend_scored(&child, limit)?;

            let cover_urls: Vec<Option<String>> = if covers {
                let client = GoogleBooksClient::from_config(
                    &config.catalog,
                    Some(config.catalog_cache_dir()),
                )?;
                let books = scored.iter().map(|(b, _)| b.clone()).collect();
                resolve_covers(&client, books, &config.catalog.placeholder_base)
                    .await
                    .into_iter()
                    .map(|b| Some(b.cover_url))
                    .collect()
            } else {
                vec![None; scored.len()]
            };

            let dur = start.elapsed().as_millis();
            if json_output {
                let items: Vec<serde_json::Value> = scored
                    .iter()
                    .zip(&cover_urls)
                    .map(|((book, score), cover)| {
                        serde_json::json!({
                            "book": book,
                            "score": score.score,
                            "reasons": score.reasons,
                            "cover_url": cover,
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({"status":"ok","data":{"child":child,"items":items},"meta":{"duration_ms":dur}}))?;
            } else if scored.is_empty() {
                println!("No reading history for '{child}'. Log a session with `readagain log`.");
            } else {
                println!("Read again for '{child}':");
                for (i, ((book, score), cover)) in scored.iter().zip(&cover_urls).enumerate() {
                    println!(
                        "  {}. {} - {} [{}]",
                        i + 1,
                        book.title,
                        book.author,
                        score.score
                    );
                    if !score.reasons.is_empty() {
                        println!("     {}", score.reasons.join(" · "));
                    }
                    if let Some(url) = cover {
                        println!("     cover: {url}");
                    }
                }
            }
        }

        // ── Children ───────────────────────────────────────────────────────
        Commands::Children => {
            let children = store.list_children()?;

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":children,"meta":{"duration_ms":dur}}))?;
            } else if children.is_empty() {
                println!("No children yet. Run `readagain seed` to add the sample child.");
            } else {
                for c in &children {
                    println!(
                        "  {:<12} {} (age {}, level {}, likes {})",
                        c.id,
                        c.name,
                        c.age,
                        c.reading_level,
                        c.favorite_genres.join(", ")
                    );
                }
            }
        }

        // ── History ────────────────────────────────────────────────────────
        Commands::History { child } => {
            let child = child_or_default(child);
            if store.fetch_profile(&child)?.is_none() {
                return Err(ReadAgainError::ChildNotFound(child).into());
            }
            let history = store.fetch_history(&child)?;
            let now = clock.now();

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"child":child,"items":history},"meta":{"duration_ms":dur}}))?;
            } else if history.is_empty() {
                println!("No books read yet.");
            } else {
                for h in &history {
                    println!(
                        "  {:>4} {} - {} (read {}×, last {} days ago)",
                        h.book_id,
                        h.title,
                        h.author,
                        h.read_count,
                        (now - h.last_read_date).num_days()
                    );
                }
            }
        }

        // ── Log ────────────────────────────────────────────────────────────
        Commands::Log {
            child,
            book,
            minutes,
            completion,
            rating,
            at,
            title,
            author,
            genre,
            difficulty,
            theme,
        } => {
            let read_at = match at {
                Some(s) => parse_instant(&s)?,
                None => clock.now(),
            };
            let session = ReadingSession {
                child_id: child_or_default(child),
                book_id: book,
                read_at,
                minutes,
                completion_rate: completion,
                engagement_rating: rating,
                book: title.map(|title| BookDetails {
                    title,
                    author,
                    search_query: String::new(),
                    difficulty_level: difficulty,
                    educational_themes: theme,
                    genre,
                }),
            };
            let updated = store.record_session(&session)?;

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":updated,"meta":{"duration_ms":dur}}))?;
            } else {
                println!(
                    "Logged '{}' for {} (read {}×, {} min total).",
                    updated.title, session.child_id, updated.read_count, updated.total_reading_time
                );
            }
        }

        // ── Stats ──────────────────────────────────────────────────────────
        Commands::Stats { child, weeks } => {
            let child = child_or_default(child);
            if store.fetch_profile(&child)?.is_none() {
                return Err(ReadAgainError::ChildNotFound(child).into());
            }
            let history = store.fetch_history(&child)?;
            let sessions = store.fetch_sessions(&child)?;
            let today = clock.now().date_naive();
            let stats = reading_stats(&history, &sessions, today);
            let grid = contribution_grid(&sessions, today, weeks)?;

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"child":child,"stats":stats,"grid":grid},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Books:            {}", stats.total_books);
                println!("Readings:         {}", stats.total_readings);
                println!("This month:       {} readings of {} books", stats.readings_this_month, stats.books_this_month);
                println!("Minutes read:     {}", stats.total_minutes);
                println!(
                    "Streak:           {} days (longest {})",
                    stats.reading_streak.current_streak, stats.reading_streak.longest_streak
                );
                println!();
                for line in render_grid(&grid) {
                    println!("  {line}");
                }
            }
        }

        // ── Search ─────────────────────────────────────────────────────────
        Commands::Search { query, limit } => {
            let client =
                GoogleBooksClient::from_config(&config.catalog, Some(config.catalog_cache_dir()))?;
            if !client.has_api_key() {
                eprintln!(
                    "Catalog API key not set. Export {} to enable search.",
                    config.catalog.api_key_env
                );
            }
            let results = client
                .search(&query, limit.unwrap_or(client.default_max_results()))
                .await
                .context("catalog search failed")?;

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"query":query,"books":results},"meta":{"duration_ms":dur}}))?;
            } else if results.is_empty() {
                println!("No results for: {query}");
            } else {
                println!("Found {} results:", results.len());
                for r in &results {
                    println!("  {} - {} ({})", r.id, r.title, r.authors.join(", "));
                }
            }
        }

        // ── Book ───────────────────────────────────────────────────────────
        Commands::Book { id, isbn } => {
            let client =
                GoogleBooksClient::from_config(&config.catalog, Some(config.catalog_cache_dir()))?;
            let found = match (id, isbn) {
                (_, Some(isbn)) => client.get_by_isbn(&isbn).await?,
                (Some(id), None) => client.get_by_id(&id).await?,
                (None, None) => {
                    return Err(ReadAgainError::InvalidArgument("pass an id or --isbn".into()).into());
                }
            };
            let Some(book) = found else {
                return Err(ReadAgainError::BookNotFound("no catalog match".into()).into());
            };

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":book,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("{} - {}", book.title, book.authors.join(", "));
                println!("  id:        {}", book.id);
                if let Some(date) = &book.published_date {
                    println!("  published: {date}");
                }
                for ident in &book.industry_identifiers {
                    println!("  {:<10} {}", format!("{}:", ident.kind), ident.identifier);
                }
                if let Some(cover) = book.image_links.as_ref().and_then(|l| l.cover()) {
                    println!("  cover:     {cover}");
                }
            }
        }

        // ── Placeholder ────────────────────────────────────────────────────
        Commands::Placeholder {
            width,
            height,
            text,
            bg,
            color,
        } => {
            if width == 0 || height == 0 {
                return Err(ReadAgainError::InvalidArgument(
                    "width and height must be positive".into(),
                )
                .into());
            }
            let image = PlaceholderImage {
                width,
                height,
                text,
                background: bg,
                color,
            };
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"content_type":PlaceholderImage::CONTENT_TYPE,"svg":image.to_svg()}}))?;
            } else {
                print!("{}", image.to_svg());
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    println!("{}", toml_string(&config)?);
                }
            }
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                } else {
                    println!("{}", path.display());
                }
            }
            ConfigAction::Init => {
                let path = AppConfig::config_path();
                if path.exists() {
                    bail!("config already exists at {}", path.display());
                }
                AppConfig::default().save()?;
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                } else {
                    println!("Wrote {}", path.display());
                }
            }
        },

        // ── Version ────────────────────────────────────────────────────────
        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version}}))?;
            } else {
                println!("readagain v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn toml_string(config: &AppConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ReadAgainError::InvalidArgument(format!("bad --at value {s:?}: {e}")).into())
}

/// Seven text rows, one per weekday offset, one column per week.
fn render_grid(grid: &[readagain_core::ContributionDay]) -> Vec<String> {
    const SHADES: [char; 4] = ['·', '░', '▒', '█'];
    let mut rows = vec![String::new(); 7];
    for (i, day) in grid.iter().enumerate() {
        let shade = SHADES[usize::from(day.activity.min(3))];
        rows[i % 7].push(shade);
    }
    rows
}
