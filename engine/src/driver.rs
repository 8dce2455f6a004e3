//! Engine subprocess lifecycle and query protocol.

use crate::parse::{parse_bestmove_line, parse_info_line, NO_MOVE};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to launch engine process: {0}")]
    Spawn(std::io::Error),
    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine closed its output stream")]
    ClosedPipe,
    #[error("engine process has no stdio pipes")]
    MissingPipe,
}

/// How to launch the engine and how hard to search.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub depth: u32,
    /// Soft budget per position. When it elapses the engine is asked to
    /// stop; the query still waits for the terminal line.
    pub budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("stockfish"),
            args: Vec::new(),
            depth: 20,
            budget: Duration::from_secs(1),
        }
    }
}

/// Result of analysing one position.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Score in pawns from the side to move; mate saturates at ±1000.
    pub score: f64,
    pub depth: u32,
    /// UCI move text, or `"(none)"` when the engine had nothing to play.
    pub best_move: String,
    pub elapsed: Duration,
}

impl Default for AnalysisReport {
    fn default() -> Self {
        Self {
            score: 0.0,
            depth: 0,
            best_move: NO_MOVE.to_string(),
            elapsed: Duration::ZERO,
        }
    }
}

/// Session state latch. `Tainted` is terminal: once any I/O with the
/// process fails the remaining lifetime of the session is a no-op.
enum SessionState {
    Fresh,
    Ready,
    Tainted(EngineError),
}

/// One engine subprocess with one query in flight at a time.
pub struct EngineDriver {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    search_cmd: String,
    budget: Duration,
    state: SessionState,
}

impl EngineDriver {
    /// Launch the engine and run the UCI handshake: identify, wait for
    /// `uciok`, apply fixed analysis options, probe with `isready` and
    /// wait for `readyok`. Any failure is a construction error.
    pub async fn spawn(config: EngineConfig) -> Result<Self, EngineError> {
        tracing::info!("launching engine {:?}", config.command);
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::Spawn)?;

        let stdin = child.stdin.take().ok_or(EngineError::MissingPipe)?;
        let stdout = child.stdout.take().ok_or(EngineError::MissingPipe)?;

        let mut driver = Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            search_cmd: format!("go depth {}", config.depth),
            budget: config.budget,
            state: SessionState::Fresh,
        };

        driver.handshake().await?;
        driver.state = SessionState::Ready;
        tracing::info!("engine ready (depth {}, budget {:?})", config.depth, config.budget);
        Ok(driver)
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci\n").await?;
        self.read_until("uciok").await?;

        self.send("setoption name Threads value 8\n").await?;
        self.send("setoption name UCI_AnalyseMode value true\n").await?;
        self.send("setoption name Use NNUE value false\n").await?;
        self.send("isready\n").await?;
        self.read_until("readyok").await?;
        Ok(())
    }

    /// Analyse one position given as a FEN string.
    ///
    /// A tainted session returns the zero report without touching the
    /// process; check [`EngineDriver::error`] after each call.
    pub async fn analyze(&mut self, fen: &str) -> AnalysisReport {
        if matches!(self.state, SessionState::Tainted(_)) {
            return AnalysisReport::default();
        }

        let start = Instant::now();
        let commands = format!("ucinewgame\nposition fen {}\n{}\n", fen, self.search_cmd);
        let outcome = async {
            self.send(&commands).await?;
            self.read_until_deadline("bestmove").await
        }
        .await;

        match outcome {
            Ok(lines) => {
                // The line before the terminal one carries score and depth.
                let info = lines
                    .len()
                    .checked_sub(2)
                    .and_then(|i| lines.get(i))
                    .map(|l| parse_info_line(l))
                    .unwrap_or_default();
                let best_move = lines
                    .last()
                    .map(|l| parse_bestmove_line(l))
                    .unwrap_or_else(|| NO_MOVE.to_string());

                AnalysisReport {
                    score: info.score.map_or(0.0, |s| s.pawns()),
                    depth: info.depth.unwrap_or(0),
                    best_move,
                    elapsed: start.elapsed(),
                }
            }
            Err(err) => {
                tracing::error!("engine query failed, session is now unusable: {}", err);
                self.state = SessionState::Tainted(err);
                AnalysisReport::default()
            }
        }
    }

    /// The latched session error, if any. Permanent once set.
    pub fn error(&self) -> Option<&EngineError> {
        match &self.state {
            SessionState::Tainted(err) => Some(err),
            SessionState::Fresh | SessionState::Ready => None,
        }
    }

    /// Ask the engine to quit and reap the process.
    pub async fn shutdown(mut self) {
        let _ = self.stdin.write_all(b"quit\n").await;
        let _ = self.stdin.flush().await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.child.wait()).await;
        let _ = self.child.kill().await;
    }

    async fn send(&mut self, data: &str) -> Result<(), EngineError> {
        tracing::trace!("uci >> {}", data.trim_end());
        self.stdin.write_all(data.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_until(&mut self, marker: &str) -> Result<Vec<String>, EngineError> {
        let mut out = Vec::new();
        loop {
            let line = self
                .lines
                .next_line()
                .await?
                .ok_or(EngineError::ClosedPipe)?;
            tracing::trace!("uci << {}", line);
            let done = line.starts_with(marker);
            out.push(line);
            if done {
                return Ok(out);
            }
        }
    }

    /// Read lines until one starts with `marker`, under the soft budget.
    ///
    /// The timer and the reader run concurrently; when the budget fires the
    /// timer only sends a `stop` hint and the loop keeps waiting on the
    /// read. The engine is expected to conclude promptly and still emit the
    /// terminal line, so the call may outlast the budget by its shutdown
    /// latency.
    async fn read_until_deadline(&mut self, marker: &str) -> Result<Vec<String>, EngineError> {
        let deadline = tokio::time::sleep(self.budget);
        tokio::pin!(deadline);

        let mut stop_sent = false;
        let mut out = Vec::new();
        loop {
            tokio::select! {
                () = &mut deadline, if !stop_sent => {
                    stop_sent = true;
                    tracing::debug!("search budget elapsed, sending stop");
                    self.stdin.write_all(b"stop\n").await?;
                    self.stdin.flush().await?;
                }
                line = self.lines.next_line() => {
                    let line = line?.ok_or(EngineError::ClosedPipe)?;
                    tracing::trace!("uci << {}", line);
                    let done = line.starts_with(marker);
                    out.push(line);
                    if done {
                        return Ok(out);
                    }
                }
            }
        }
    }
}
