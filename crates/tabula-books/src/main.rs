//! Tabula Books - entry point.

use std::path::PathBuf;

use tracing::{error, info};

use tabula_books::store::BookStore;
use tabula_books::users::UserDirectory;
use tabula_books::{errors, BooksApp};
use tabula_config::{ConfigError, ConfigLoader, TabulaConfig};
use tabula_core::Locale;
use tabula_docs::Catalog;
use tabula_telemetry::init_telemetry;

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
    /// Print the discovery catalog in this locale and exit.
    catalog: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = std::env::var_os("TABULA_CONFIG").map(PathBuf::from);
        let mut catalog = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--catalog" => {
                    catalog = Some(args.next().unwrap_or_else(|| "ru".to_string()));
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("tabula-books {}", tabula_books::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config, catalog }
    }
}

fn print_help() {
    println!(
        r"Tabula Books - demonstration books API

USAGE:
    tabula-books [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
        --catalog <LOCALE> Print the method catalog as JSON and exit
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    TABULA_CONFIG                       Configuration file, when --config is not given
    TABULA__SERVER__HTTP_ADDR           Listen address (default: 0.0.0.0:8080)
    TABULA__SERVER__BASE_PATH           Route prefix (default: /api/v1)
    TABULA__API__DEFAULT_LOCALE         Locale for requests without one (default: ru)
    TABULA__AUTH__ACCESS_TOKEN_TTL_SECS Access token lifetime (default: 3600)
    TABULA__TELEMETRY__METRICS__ENABLED Serve Prometheus metrics

    A .env file in the working directory is read first.

EXAMPLES:
    tabula-books --config /etc/tabula/books.toml
    TABULA__SERVER__HTTP_ADDR=127.0.0.1:3000 tabula-books
"
    );
}

fn load_config(path: Option<&PathBuf>) -> Result<TabulaConfig, ConfigError> {
    let mut loader = ConfigLoader::new().with_defaults().with_dotenv();
    if let Some(path) = path {
        loader = loader.with_file(path)?;
    }
    loader.with_env_prefix("TABULA").load()
}

fn print_catalog(config: TabulaConfig, locale: &str) {
    let Some(locale) = Locale::from_code(locale) else {
        eprintln!("Unknown locale: {locale}");
        std::process::exit(1);
    };
    let app = BooksApp::new(config, BookStore::new(), UserDirectory::new());
    let rendered = Catalog::build(&app.registry(), &errors::descriptions(), locale)
        .and_then(|catalog| catalog.to_json_pretty());
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to build catalog: {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Some(locale) = args.catalog {
        print_catalog(config, &locale);
        return;
    }

    if let Err(e) = init_telemetry(&config.telemetry.to_telemetry()) {
        eprintln!("Failed to initialize telemetry: {e}");
        std::process::exit(1);
    }

    let app = match BooksApp::seeded(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to seed the book store: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting Tabula Books v{}", tabula_books::VERSION);
    info!(
        books = app.store().len(),
        addr = %app.config().server.http_addr,
        base_path = %app.config().server.base_path,
        "serving"
    );

    if let Err(e) = app.server().run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
