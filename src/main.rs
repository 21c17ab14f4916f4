use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

use postloop::config::RuntimeConfig;
use postloop::domain::QueryCriteria;
use postloop::hooks::{HookValue, LOOP_END, LOOP_START, THE_POST};
use postloop::repository::InMemoryRepository;
use postloop::{Query, Request};

mod cli;

use cli::Cli;
use cli::commands::{Commands, Source};

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("postloop.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    // RUST_LOG wins over the configured level
    if std::env::var_os("RUST_LOG").is_none() {
        if let Some(level) = level {
            builder.parse_filters(level);
        }
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_repository(source: &Source, config: &RuntimeConfig) -> Result<InMemoryRepository> {
    let Some(path) = source.fixture.as_ref().or(config.content.fixture.as_ref()) else {
        eyre::bail!("No content fixture given; pass --fixture or set content.fixture in the config");
    };
    InMemoryRepository::load(path).context(format!("Failed to load fixture {}", path.display()))
}

fn run_application(cli: &Cli, config: &RuntimeConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let request = Request::with_config(config.query.clone());

    match &cli.command {
        Commands::Query {
            item_type,
            status,
            author,
            search,
            orderby,
            order,
            per_page,
            page,
            args,
            full,
            source,
        } => {
            let criteria = match args {
                Some(raw) => QueryCriteria::from_query_string(raw)?,
                None => {
                    let mut bag = Map::new();
                    let text = [
                        ("post_type", item_type),
                        ("post_status", status),
                        ("author_name", author),
                        ("s", search),
                        ("orderby", orderby),
                        ("order", order),
                    ];
                    for (key, value) in text {
                        if let Some(value) = value {
                            bag.insert(key.to_string(), Value::from(value.as_str()));
                        }
                    }
                    if let Some(n) = per_page {
                        bag.insert("posts_per_page".to_string(), Value::from(*n));
                    }
                    if let Some(p) = page {
                        bag.insert("paged".to_string(), Value::from(*p));
                    }
                    QueryCriteria::from_args(&bag)?
                }
            };
            let repository = load_repository(source, config)?;
            let query = Query::new(&request, &repository, criteria);
            walk(query, &request, *full)?;
        }
        Commands::Show { target, page, source } => {
            let criteria = match target.parse::<u64>() {
                Ok(id) => QueryCriteria::new().with_id(id),
                Err(_) => QueryCriteria::new().with_slug(target.as_str()),
            };
            if let Some(p) = page {
                request.context_mut().set_page(*p);
            }
            let repository = load_repository(source, config)?;
            let query = Query::new(&request, &repository, criteria);
            walk(query, &request, true)?;
        }
    }

    if cli.is_verbose() {
        for hook in [LOOP_START, THE_POST, LOOP_END] {
            println!("  {} fired {} times", hook.cyan(), request.hooks().did_action(hook));
        }
    }
    Ok(())
}

fn walk(mut query: Query, request: &Request, full: bool) -> Result<()> {
    if let Some(error) = query.error() {
        println!("{} {}", "Repository error:".red(), error);
    }

    let result = query.result();
    if result.is_not_found() {
        println!("{}", "Nothing found".yellow());
        return Ok(());
    }
    println!(
        "{} {} of {} (page count {})",
        "Found:".green(),
        result.len(),
        result.found_count(),
        result.page_count()
    );

    while query.has_next(request)? {
        let Some(item) = query.advance(request)? else {
            break;
        };
        let title = request
            .hooks()
            .apply_filters("the_title", HookValue::from(item.title.as_str()), &[HookValue::Item(item.clone())])?;

        println!(
            "{} {} {} [{}] {}",
            format!("#{}", item.id).bold(),
            title.as_str().unwrap_or(&item.title),
            item.item_type.dimmed(),
            item.status,
            item.created_at.format("%Y-%m-%d").to_string().dimmed()
        );

        if full {
            let context = request.context();
            if context.is_multi_page() {
                println!("  {}", format!("page {} of {}", context.page(), context.total_pages()).dimmed());
            }
            if let Some(content) = context.page_content() {
                for line in content.lines() {
                    println!("  {}", line);
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = RuntimeConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging at the configured level
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
