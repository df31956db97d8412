// Command-line reader for Wattpad stories.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr, filtered by RUST_LOG)
// 3. Load config
// 4. Build the client
// 5. Run the requested command (the demo when none is given)

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use wattpad_core::config::{self, ClientConfig};
use wattpad_core::constants::DEFAULT_RENDER_CONCURRENCY;
use wattpad_core::{HtmlContent, RenderedPage, Story, WattpadClient, WattpadClientBuilder};

/// Story used when no subcommand is given.
const DEMO_STORY_ID: u64 = 336166598;

#[derive(Debug, Parser)]
#[command(name = "wattpad", version, about = "Fetch and read Wattpad stories")]
struct Cli {
    /// Config file to load instead of config/wattpad.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bypass the response cache for this run.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show a story's metadata and part list.
    Story { id: u64 },
    /// Show the story a part belongs to.
    Part { part_id: u64 },
    /// Print the text of a story's parts.
    Render {
        story_id: u64,
        /// Only this part id; all parts otherwise.
        #[arg(long)]
        part: Option<u64>,
    },
    /// Search stories.
    Search {
        query: String,
        #[arg(long)]
        mature: bool,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Search users.
    Users {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// List browse topics.
    Topics {
        #[arg(long, default_value_t = 1)]
        language: u32,
    },
    /// Delete every cached response.
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse arguments
    let cli = Cli::parse();

    // 2. Initialize tracing
    init_tracing()?;
    info!(
        "{} {} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    // 3. Load config
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    // 4. Build the client
    let mut builder = WattpadClientBuilder::from_config(&config);
    if bypasses_cache(&cli) {
        builder = builder.use_cache(false);
    }
    let client = builder.build().context("failed to build client")?;

    // 5. Run
    match cli.command {
        None => run_demo(&client).await,
        Some(Command::Story { id }) => {
            let story = client.get_story_by_id(id).await?;
            print_story(&story);
            Ok(())
        }
        Some(Command::Part { part_id }) => {
            let story = client.get_story_by_part_id(part_id).await?;
            print_story(&story);
            Ok(())
        }
        Some(Command::Render { story_id, part }) => render(&client, story_id, part).await,
        Some(Command::Search {
            query,
            mature,
            limit,
        }) => {
            let results = client.search_stories(&query, mature, limit).await?;
            println!("{} results", results.total);
            for story in &results.stories {
                let author = story.user.as_ref().map_or("?", |u| u.name.as_str());
                println!(
                    "{:>12}  {} by {} ({} parts, {} reads)",
                    story.id, story.title, author, story.num_parts, story.read_count
                );
            }
            Ok(())
        }
        Some(Command::Users {
            query,
            limit,
            offset,
        }) => {
            let results = client.search_users(&query, limit, offset).await?;
            for user in &results.users {
                println!(
                    "@{}  {} ({} followers, {} stories)",
                    user.username, user.name, user.num_followers, user.num_stories_published
                );
            }
            Ok(())
        }
        Some(Command::Topics { language }) => {
            for topic in client.browse_topics(language).await? {
                println!("{}", topic.name);
            }
            Ok(())
        }
        Some(Command::ClearCache) => {
            if client.cache().is_none() {
                println!("Caching is disabled in the configuration; nothing to clear.");
            } else {
                client.clear_cache();
                println!("Cache cleared.");
            }
            Ok(())
        }
    }
}

/// `--no-cache` skips cache reads and writes, but `clear-cache` still needs
/// the cache open.
fn bypasses_cache(cli: &Cli) -> bool {
    cli.no_cache && !matches!(cli.command, Some(Command::ClearCache))
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ClientConfig> {
    let config = match path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config()?,
    };
    Ok(config)
}

/// Fetch the demo story, print it, and render its first real chapter.
async fn run_demo(client: &WattpadClient) -> anyhow::Result<()> {
    println!("Wattpad API Rust Demo");
    println!("\nFetching story by ID: {DEMO_STORY_ID}");
    let story = Story::from_id(DEMO_STORY_ID, client)
        .await
        .context("failed to fetch demo story")?;
    print_story(&story);

    match story.first_chapter() {
        Some(part) => {
            println!("\nRendering Part: '{}' (ID: {})", part.title, part.id);
            let page = part.render_with(client).await?;
            print_page(&page);
        }
        None => println!("\nCould not find a suitable part to render."),
    }
    Ok(())
}

async fn render(client: &WattpadClient, story_id: u64, part_id: Option<u64>) -> anyhow::Result<()> {
    let story = client.get_story_by_id(story_id).await?;

    let pages = match part_id {
        Some(id) => {
            let part = story
                .part(id)
                .with_context(|| format!("story {story_id} has no part {id}"))?;
            vec![client.render_part(part).await?]
        }
        None => client.render_story(&story, DEFAULT_RENDER_CONCURRENCY).await?,
    };

    for page in &pages {
        print_page(page);
    }
    Ok(())
}

fn print_story(story: &Story) {
    println!("Title: {}", story.title);
    println!("Author: {} (@{})", story.author.name, story.author.username);
    println!("Description: {}", truncate(&story.description, 150));
    println!("Tags: {}", story.tags.join(", "));
    println!("Parts: {}", story.parts.len());
    println!("URL: {}", story.url.as_deref().unwrap_or("N/A"));
    println!("Cover: {}", story.cover.as_deref().unwrap_or("N/A"));
    println!("Is Paywalled: {}", story.is_paywalled);
    let last_update = story
        .last_published_part
        .as_ref()
        .and_then(|p| p.create_date)
        .map_or_else(|| "N/A".to_string(), |d| d.to_string());
    println!("Last Update: {last_update}");

    for part in &story.parts {
        println!("  {:>12}  {}", part.id, part.title);
    }
}

fn print_page(page: &RenderedPage) {
    println!("\n--- START OF PART: {} ---", page.title);
    for block in &page.content {
        match block {
            HtmlContent::Text(_) => println!("{}", block.sanitized_text().trim()),
            HtmlContent::Image(url) => println!("[IMAGE: {url}]"),
        }
        println!();
    }
    println!("--- END OF PART ---");
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Log to stderr so stdout stays clean for story text.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wattpad_core=info,wattpad_cli=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_matches_package() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some(env!("CARGO_PKG_VERSION")));
        assert_eq!(cmd.get_name(), "wattpad");
    }

    #[test]
    fn parses_render_with_part() {
        let cli = Cli::try_parse_from(["wattpad", "--no-cache", "render", "42", "--part", "7"]).unwrap();
        assert!(cli.no_cache);
        match cli.command {
            Some(Command::Render { story_id, part }) => {
                assert_eq!(story_id, 42);
                assert_eq!(part, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_runs_demo() {
        let cli = Cli::try_parse_from(["wattpad"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn search_defaults() {
        let cli = Cli::try_parse_from(["wattpad", "search", "dragons"]).unwrap();
        match cli.command {
            Some(Command::Search { query, mature, limit }) => {
                assert_eq!(query, "dragons");
                assert!(!mature);
                assert_eq!(limit, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn clear_cache_ignores_no_cache_flag() {
        let cli = Cli::try_parse_from(["wattpad", "--no-cache", "clear-cache"]).unwrap();
        assert!(!bypasses_cache(&cli));

        let cli = Cli::try_parse_from(["wattpad", "--no-cache", "story", "1"]).unwrap();
        assert!(bypasses_cache(&cli));
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
