use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use chess_session::{controller_from_config, shell::Shell, Config, Difficulty};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Play chess against an engine, with a confirmation step before every reply.
#[derive(Parser, Debug)]
#[command(name = "chess-session", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// UCI engine binary for the automated side (random moves if omitted)
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// Seed for the first-mover draw and the random mover
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Difficulty: easy, medium, hard (or 1-3)
    #[arg(long, global = true)]
    difficulty: Option<Difficulty>,

    /// Milliseconds the engine may overrun its think time
    #[arg(long, global = true)]
    grace_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play in the terminal (the default)
    Play,
    /// Serve the session over HTTP
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(engine) = &self.engine {
            config.engine_path = Some(engine.clone());
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.difficulty.is_some() {
            config.difficulty = self.difficulty;
        }
        if let Some(grace_ms) = self.grace_ms {
            config.grace_ms = grace_ms;
        }
        if let Some(Command::Serve {
            bind: Some(bind), ..
        }) = &self.command
        {
            config.bind = *bind;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    info!(?config, "configuration loaded");

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(config).await,
        Command::Serve { .. } => serve(config).await,
    }
}

async fn play(config: Config) -> Result<()> {
    let controller = controller_from_config(&config);
    let mut shell = Shell::new(controller).with_difficulty(config.difficulty);
    let mut stdout = tokio::io::stdout();
    shell
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await
        .context("terminal shell failed")
}

#[cfg(feature = "server")]
async fn serve(config: Config) -> Result<()> {
    let router = chess_session::server::serve_session(controller_from_config(&config));
    info!(addr = %config.bind, "serving session over http");
    axum::Server::bind(&config.bind)
        .serve(router.into_make_service())
        .await
        .context("http server failed")
}

#[cfg(not(feature = "server"))]
async fn serve(_config: Config) -> Result<()> {
    anyhow::bail!("this build has no HTTP shell; rebuild with `--features server`")
}
