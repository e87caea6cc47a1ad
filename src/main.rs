use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use readnext::api::rate_limit::RateLimiter;
use readnext::api::{AppState, create_router};
use readnext::client::{BookService, PageOutcome, SearchPager};
use readnext::config::CONFIG;
use readnext::data_models::Book;
use readnext::upstream::GoogleBooksClient;

#[derive(Parser)]
#[command(name = "readnext", about = "Book discovery API and client")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Search books through a running API
    Search {
        query: String,
        /// Pages to load, counting the first
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show one book
    Book { id: String },
    /// Category recommendations
    Recommend {
        #[arg(default_value = "fiction")]
        category: String,
        #[arg(long, default_value_t = 10)]
        max_results: u32,
    },
    /// Popular books
    Popular {
        #[arg(long, default_value_t = 8)]
        max_results: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .init();

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(port.unwrap_or(CONFIG.port)).await,
        Command::Search { query, pages } => search(&query, pages).await,
        Command::Book { id } => show_book(&id).await,
        Command::Recommend {
            category,
            max_results,
        } => recommend(&category, max_results).await,
        Command::Popular { max_results } => popular(max_results).await,
    }
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let books = Arc::new(GoogleBooksClient::new(
        &CONFIG.books_api_url,
        CONFIG.books_api_key.clone(),
    )?);
    let state = Arc::new(AppState::new(books, &CONFIG));
    let limiter = Arc::new(RateLimiter::new(
        CONFIG.rate_limit_window,
        CONFIG.rate_limit_max_requests,
    ));

    let purge = limiter.clone();
    let window = limiter.window();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(window.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            let purged = purge.purge_expired(Instant::now());
            if purged > 0 {
                tracing::debug!(purged, "expired rate limit windows dropped");
            }
        }
    });

    let static_dir = CONFIG.serve_static.then_some(CONFIG.static_dir.as_str());
    let app = create_router(state, limiter, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on port {port}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn book_service() -> anyhow::Result<BookService> {
    BookService::new(&CONFIG.client_api_url)
}

async fn search(query: &str, pages: usize) -> anyhow::Result<()> {
    let pager = SearchPager::new(book_service()?);
    pager.search(query).await?;
    for _ in 1..pages {
        if !matches!(pager.load_more().await?, PageOutcome::Loaded { .. }) {
            break;
        }
    }
    if let Some(page) = pager.snapshot() {
        println!(
            "{} of {} results for {:?}",
            page.books.len(),
            page.total_items,
            page.query
        );
        page.books.iter().for_each(print_book);
    }
    Ok(())
}

async fn show_book(id: &str) -> anyhow::Result<()> {
    let book = book_service()?.get_book_by_id(id).await?;
    println!("{}", serde_json::to_string_pretty(&book)?);
    Ok(())
}

async fn recommend(category: &str, max_results: u32) -> anyhow::Result<()> {
    let response = book_service()?
        .get_recommendations(category, max_results)
        .await?;
    response.books.iter().for_each(print_book);
    Ok(())
}

async fn popular(max_results: u32) -> anyhow::Result<()> {
    let response = book_service()?.get_popular_books(max_results).await?;
    if response.books.is_empty() {
        println!("Popular books temporarily unavailable. Try searching for specific books instead!");
    }
    response.books.iter().for_each(print_book);
    Ok(())
}

fn print_book(book: &Book) {
    let authors = if book.authors.is_empty() {
        "Unknown Author".to_string()
    } else {
        book.authors.join(", ")
    };
    println!(
        "{:<14} {} by {}",
        book.id,
        book.title.as_deref().unwrap_or_default(),
        authors
    );
}
