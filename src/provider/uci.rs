use std::{path::PathBuf, process::Stdio, str::FromStr};

use async_trait::async_trait;
use shakmaty::{fen::Fen, uci::Uci, Chess, EnPassantMode};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    process::{ChildStdin, ChildStdout, Command},
};
use tracing::{debug, instrument, trace};

use super::{MoveProvider, ProviderError};
use crate::difficulty::StrengthBudget;

/// An external engine speaking UCI over stdin/stdout.
///
/// A fresh engine process is started for every move and told to quit once it
/// has answered, so nothing carries over between calls. The process is killed
/// if the call is abandoned.
#[derive(Debug, Clone)]
pub struct UciEngine {
    path: PathBuf,
    args: Vec<String>,
    name: String,
}

impl UciEngine {
    pub fn new(path: impl Into<PathBuf>) -> UciEngine {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "uci".to_string());
        UciEngine {
            path,
            args: Vec::new(),
            name,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> UciEngine {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

struct Conversation {
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl Conversation {
    async fn send(&mut self, command: &str) -> Result<(), ProviderError> {
        trace!(command, "to engine");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads lines until one starts with `prefix`, and returns it.
    async fn wait_for(&mut self, prefix: &str) -> Result<String, ProviderError> {
        while let Some(line) = self.lines.next_line().await? {
            trace!(line, "from engine");
            if line.trim_start().starts_with(prefix) {
                return Ok(line);
            }
        }
        Err(ProviderError::Protocol(format!(
            "engine closed its output before {prefix}"
        )))
    }
}

fn parse_bestmove(line: &str) -> Result<Uci, ProviderError> {
    let token = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ProviderError::Protocol(format!("malformed reply {line:?}")))?;
    if token == "(none)" || token == "0000" {
        return Err(ProviderError::NoMove);
    }
    Uci::from_str(token).map_err(|_| ProviderError::Protocol(format!("unparsable move {token:?}")))
}

#[async_trait]
impl MoveProvider for UciEngine {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(movetime = ?budget.movetime))]
    async fn choose_move(
        &mut self,
        position: &Chess,
        budget: StrengthBudget,
    ) -> Result<Uci, ProviderError> {
        let mut child = Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProviderError::Unavailable(format!("{}: {e}", self.path.display())))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(ProviderError::Unavailable(
                "engine process has no stdio".to_string(),
            ));
        };
        let mut conv = Conversation {
            stdin,
            lines: BufReader::new(stdout).lines(),
        };

        conv.send("uci").await?;
        conv.wait_for("uciok").await?;
        conv.send("isready").await?;
        conv.wait_for("readyok").await?;

        let fen = Fen::from_position(position.clone(), EnPassantMode::Legal);
        conv.send(&format!("position fen {fen}")).await?;
        conv.send(&format!("go movetime {}", budget.movetime.as_millis()))
            .await?;
        let reply = conv.wait_for("bestmove").await?;
        let chosen = parse_bestmove(&reply);

        // The answer is in; a failing quit does not change it.
        if conv.send("quit").await.is_ok() {
            let _ = child.wait().await;
        }
        debug!(engine = %self.name, reply, "engine answered");
        chosen
    }
}
