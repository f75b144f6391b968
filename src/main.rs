mod classify;
mod config;
mod export;
mod favorites;
mod feed;
mod filter;
mod models;
mod store;
mod swipe;
#[cfg(test)]
mod testing;
mod tui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use favorites::Favorites;
use feed::{FeedSource, HttpFeed};
use filter::{FilterConfig, JobTypeFilter, PostedWithin, SortKey, Sponsorship, ViewStats};
use classify::{annotate_all, Region};
use models::{AnnotatedListing, ListingKey};
use std::fs::OpenOptions;
use std::path::PathBuf;
use store::Store;
use swipe::SwipeSession;
use tracing::info;
use tui::truncate;

#[derive(Parser)]
#[command(name = "internhunt")]
#[command(about = "Internship listings aggregator - filter, score, and swipe through openings")]
struct Cli {
    /// Listings feed URL
    #[arg(long, global = true)]
    feed_url: Option<String>,

    /// Directory holding favorites and swipe state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Match title, company, or location (case-insensitive)
    #[arg(short, long, default_value = "")]
    search: String,

    /// Minimum match score (0-100)
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    min_score: u8,

    /// Job type
    #[arg(short, long, value_enum, default_value_t = JobTypeFilter::Software)]
    job_type: JobTypeFilter,

    /// Region
    #[arg(short, long, value_enum, default_value_t = Region::All)]
    region: Region,

    /// Visa sponsorship
    #[arg(long, value_enum, default_value_t = Sponsorship::All)]
    sponsorship: Sponsorship,

    /// Only listings posted within this many days
    #[arg(short, long, value_enum, default_value_t = PostedWithin::All)]
    posted_within: PostedWithin,

    /// Only starred listings
    #[arg(short, long)]
    favorites: bool,

    /// Sort order
    #[arg(long, value_enum, default_value_t = SortKey::Match)]
    sort: SortKey,
}

impl FilterArgs {
    fn to_config(&self) -> FilterConfig {
        FilterConfig {
            search: self.search.clone(),
            min_score: self.min_score,
            job_type: self.job_type,
            region: self.region,
            sponsorship: self.sponsorship,
            posted_within: self.posted_within,
            favorites_only: self.favorites,
            sort: self.sort,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List matching internships
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Number of jobs to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Export matching internships as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Browse matching internships interactively
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Review internships one at a time (left: pass, right: like)
    Swipe,

    /// Star or unstar a listing by key ("Company-Title")
    Star {
        key: String,
    },

    /// List starred listings
    Favorites,

    /// Clear all swipe decisions and the favorites they created
    Reset,
}

impl Commands {
    fn is_interactive(&self) -> bool {
        matches!(self, Commands::Browse { .. } | Commands::Swipe)
    }
}

fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if interactive {
        // The alternate screen owns the terminal; log to a file instead.
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_path())
            .with_context(|| format!("Failed to open log file {}", config.log_path().display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn fetch_view(
    feed: &dyn FeedSource,
    store: &Store,
    filters: &FilterArgs,
) -> Result<(Vec<AnnotatedListing>, Vec<AnnotatedListing>)> {
    let all = annotate_all(feed.fetch()?);
    let favorites = Favorites::new(store).all();
    let now = chrono::Utc::now().timestamp();
    let view = filters.to_config().apply(&all, &favorites, now);
    Ok((all, view))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.feed_url, cli.data_dir);
    init_logging(&config, cli.command.is_interactive())?;

    let store = Store::open(&config.store_path())?;
    let feed = HttpFeed::new(config.feed_url.clone())?;
    info!("Using store {} and feed {}", store.path().display(), feed.url());

    match cli.command {
        Commands::List { filters, limit } => {
            let (all, view) = fetch_view(&feed, &store, &filters)?;
            let stats = ViewStats::new(all.len(), &view);
            let favorites = Favorites::new(&store).all();

            if view.is_empty() {
                println!("No jobs match your current filters.");
                println!("Try clearing --search and --min-score.");
            } else {
                println!(
                    "{:<2} {:>5} {:<36} {:<22} {:<24} {:<12}",
                    "", "MATCH", "TITLE", "COMPANY", "LOCATION", "POSTED"
                );
                println!("{}", "-".repeat(106));
                for job in view.iter().take(limit.unwrap_or(usize::MAX)) {
                    let star = if favorites.contains(&job.key()) { "*" } else { "" };
                    println!(
                        "{:<2} {:>4}% {:<36} {:<22} {:<24} {:<12}",
                        star,
                        job.match_score,
                        truncate(&job.listing.title, 34),
                        truncate(&job.listing.company_name, 20),
                        truncate(&job.listing.locations_display(), 22),
                        export::format_date(job.listing.date_posted),
                    );
                }
            }

            println!();
            println!(
                "Total: {}  After filters: {}  Top match: {}  High matches: {}",
                stats.total,
                stats.filtered,
                stats
                    .top_score
                    .map(|s| format!("{}%", s))
                    .unwrap_or_else(|| "N/A".to_string()),
                stats.high_matches
            );
        }

        Commands::Export { filters, output } => {
            let (_, view) = fetch_view(&feed, &store, &filters)?;
            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    export::write_csv(file, &view)?;
                    println!("Exported {} job(s) to {}", view.len(), path.display());
                }
                None => export::write_csv(std::io::stdout().lock(), &view)?,
            }
        }

        Commands::Browse { filters } => {
            let (all, _) = fetch_view(&feed, &store, &filters)?;
            if let Some(url) = tui::run_browse(&store, &feed, all, filters.to_config())? {
                println!("{}", url);
            }
        }

        Commands::Swipe => {
            let mut session = SwipeSession::load(&store);
            tui::run_swipe(&mut session, &feed)?;
            let stats = session.stats();
            println!(
                "Liked: {}  Passed: {}  Remaining: {}",
                stats.liked, stats.passed, stats.remaining
            );
        }

        Commands::Star { key } => {
            let key = ListingKey::from(key);
            if Favorites::new(&store).toggle(&key)? {
                println!("Starred '{}'.", key);
            } else {
                println!("Unstarred '{}'.", key);
            }
        }

        Commands::Favorites => {
            let favorites = Favorites::new(&store).all();
            if favorites.is_empty() {
                println!("No favorites yet.");
            } else {
                for key in favorites {
                    println!("* {}", key);
                }
            }
        }

        Commands::Reset => {
            let mut session = SwipeSession::load(&store);
            session.reset(&feed)?;
            println!(
                "Swipes reset. {} job(s) ready to review.",
                session.stats().remaining
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_filter_args_parse() {
        let cli = Cli::try_parse_from([
            "internhunt",
            "list",
            "--search",
            "google",
            "--min-score",
            "40",
            "--job-type",
            "quant",
            "--region",
            "europe",
            "--sponsorship",
            "no-sponsors",
            "--posted-within",
            "30",
            "--favorites",
            "--sort",
            "company",
        ])
        .unwrap();
        let Commands::List { filters, limit } = cli.command else {
            panic!("expected list command");
        };
        let config = filters.to_config();
        assert_eq!(config.search, "google");
        assert_eq!(config.min_score, 40);
        assert_eq!(config.job_type, JobTypeFilter::Quant);
        assert_eq!(config.region, Region::Europe);
        assert_eq!(config.sponsorship, Sponsorship::NoSponsors);
        assert_eq!(config.posted_within, PostedWithin::Month);
        assert!(config.favorites_only);
        assert_eq!(config.sort, SortKey::Company);
        assert_eq!(limit, None);
    }

    #[test]
    fn test_filter_defaults_match_list_view() {
        let cli = Cli::try_parse_from(["internhunt", "export"]).unwrap();
        let Commands::Export { filters, output } = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(filters.to_config(), FilterConfig::default());
        assert!(output.is_none());
    }

    #[test]
    fn test_min_score_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["internhunt", "list", "--min-score", "101"]).is_err());
        assert!(Cli::try_parse_from(["internhunt", "list", "--posted-within", "14"]).is_err());
    }
}
