use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use xtra_core::{
    logging, BackendKind, BackendPreference, CatalogService, ChannelRef, Config, GameRef, LogicalQuery,
};
use xtra_media_providers::{BroadcastType, StreamSort, VideoPeriod, VideoSort};

#[derive(Parser, Debug)]
#[command(name = "xtra-browse")]
#[command(about = "Browse streams, videos and clips from the command line", long_about = None)]
struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, short, env = "XTRA_CONFIG")]
    config: Option<String>,

    /// Backend to try, in order; repeat for fallback (default from config)
    #[arg(long = "backend", global = true, value_parser = parse_backend)]
    backends: Vec<BackendKind>,

    /// Maximum number of pages to fetch
    #[arg(long, global = true, default_value = "1")]
    pages: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Most watched categories
    TopGames {
        #[arg(long)]
        tag: Vec<String>,
    },
    /// Most watched live streams
    TopStreams {
        #[arg(long)]
        tag: Vec<String>,
    },
    /// Live streams in a category
    GameStreams {
        #[command(flatten)]
        game: GameArgs,
        #[arg(long)]
        recent: bool,
    },
    /// Past broadcasts in a category
    GameVideos {
        #[command(flatten)]
        game: GameArgs,
        #[command(flatten)]
        filter: VideoArgs,
        #[arg(long)]
        language: Option<String>,
    },
    /// Clips in a category
    GameClips {
        #[command(flatten)]
        game: GameArgs,
        #[arg(long, value_parser = parse_period, default_value = "week")]
        period: VideoPeriod,
    },
    /// Past broadcasts of a channel
    ChannelVideos {
        #[command(flatten)]
        channel: ChannelArgs,
        #[command(flatten)]
        filter: VideoArgs,
    },
    /// Clips of a channel
    ChannelClips {
        #[command(flatten)]
        channel: ChannelArgs,
        #[arg(long, value_parser = parse_period, default_value = "week")]
        period: VideoPeriod,
    },
    SearchChannels {
        #[arg(long)]
        query: String,
    },
    SearchGames {
        #[arg(long)]
        query: String,
    },
    SearchVideos {
        #[arg(long)]
        query: String,
    },
    /// Cheermotes available in a channel (global only when omitted)
    CheerEmotes {
        #[arg(long, default_value = "")]
        channel: String,
        /// Prefer animated emotes (also enabled by `cheer.animated`)
        #[arg(long)]
        animated: bool,
    },
}

#[derive(clap::Args, Debug)]
struct GameArgs {
    /// Category name (GraphQL)
    #[arg(long)]
    game: Option<String>,
    /// Category id (Helix)
    #[arg(long)]
    game_id: Option<String>,
}

impl GameArgs {
    fn into_ref(self) -> GameRef {
        GameRef {
            id: self.game_id,
            name: self.game,
        }
    }
}

#[derive(clap::Args, Debug)]
struct ChannelArgs {
    /// Channel login (GraphQL)
    #[arg(long)]
    channel: Option<String>,
    /// Channel id (Helix)
    #[arg(long)]
    channel_id: Option<String>,
}

impl ChannelArgs {
    fn into_ref(self) -> ChannelRef {
        ChannelRef {
            id: self.channel_id,
            login: self.channel,
        }
    }
}

#[derive(clap::Args, Debug)]
struct VideoArgs {
    #[arg(long, value_parser = parse_sort, default_value = "views")]
    sort: VideoSort,
    #[arg(long, value_parser = parse_period, default_value = "week")]
    period: VideoPeriod,
    /// archive, highlight or upload; all types when omitted
    #[arg(long = "type", value_parser = parse_broadcast_type)]
    broadcast_type: Option<BroadcastType>,
}

fn parse_backend(value: &str) -> std::result::Result<BackendKind, String> {
    BackendKind::parse(value).ok_or_else(|| format!("unknown backend `{value}`"))
}

fn parse_sort(value: &str) -> std::result::Result<VideoSort, String> {
    VideoSort::parse(value).ok_or_else(|| format!("unknown sort `{value}`"))
}

fn parse_period(value: &str) -> std::result::Result<VideoPeriod, String> {
    VideoPeriod::parse(value).ok_or_else(|| format!("unknown period `{value}`"))
}

fn parse_broadcast_type(value: &str) -> std::result::Result<BroadcastType, String> {
    BroadcastType::parse(value).ok_or_else(|| format!("unknown broadcast type `{value}`"))
}

fn query(command: Command) -> Option<LogicalQuery> {
    let query = match command {
        Command::TopGames { tag } => LogicalQuery::TopGames { tags: tag },
        Command::TopStreams { tag } => LogicalQuery::TopStreams { tags: tag },
        Command::GameStreams { game, recent } => LogicalQuery::GameStreams {
            game: game.into_ref(),
            sort: if recent { StreamSort::Recent } else { StreamSort::ViewerCount },
            tags: Vec::new(),
        },
        Command::GameVideos { game, filter, language } => LogicalQuery::GameVideos {
            game: game.into_ref(),
            sort: filter.sort,
            period: filter.period,
            broadcast_type: filter.broadcast_type,
            language,
        },
        Command::GameClips { game, period } => LogicalQuery::GameClips { game: game.into_ref(), period },
        Command::ChannelVideos { channel, filter } => LogicalQuery::ChannelVideos {
            channel: channel.into_ref(),
            sort: filter.sort,
            period: filter.period,
            broadcast_type: filter.broadcast_type,
        },
        Command::ChannelClips { channel, period } => LogicalQuery::ChannelClips {
            channel: channel.into_ref(),
            period,
        },
        Command::SearchChannels { query } => LogicalQuery::SearchChannels { query },
        Command::SearchGames { query } => LogicalQuery::SearchGames { query },
        Command::SearchVideos { query } => LogicalQuery::SearchVideos { query },
        Command::CheerEmotes { .. } => return None,
    };
    Some(query)
}

fn emit<T: Serialize>(out: &mut impl Write, items: &[T]) -> Result<()> {
    for item in items {
        serde_json::to_writer(&mut *out, item)?;
        writeln!(out)?;
    }
    Ok(())
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let catalog = CatalogService::from_config(&config)?;

    if let Command::CheerEmotes { channel, animated } = &cli.command {
        let animated = *animated || config.cheer.animated;
        let emotes = catalog.load_cheer_emotes(channel, animated).await?;
        info!(channel = %channel, count = emotes.len(), "Loaded cheer emotes");
        return emit(&mut std::io::stdout().lock(), emotes.as_slice());
    }

    let preference = if cli.backends.is_empty() {
        catalog.default_preference().clone()
    } else {
        BackendPreference::new(cli.backends)?
    };
    let Some(query) = query(cli.command) else {
        return Ok(());
    };

    let listing = catalog.open_listing(query, &preference)?;
    for _ in 0..cli.pages.max(1) {
        let page = listing.load_more().await?;
        info!(
            backend = %page.backend,
            items = page.len(),
            skipped = page.skipped,
            has_more = page.has_more,
            "Fetched page"
        );
        emit(&mut std::io::stdout().lock(), &page.items)?;
        if !page.has_more {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("Config validation error: {problem}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            problems.len()
        ));
    }

    logging::init_logging(&config.logging)?;

    if let Err(e) = run(cli, config).await {
        error!(error = %e, "xtra-browse failed");
        return Err(e);
    }
    Ok(())
}
