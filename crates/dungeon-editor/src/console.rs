//! Debug console.
//!
//! A worker thread reads commands from stdin and hands them to the main loop
//! through a [`CommandQueue`]. The queue is the only state shared between
//! threads; the editor drains it once per update.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::editor::Tool;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Liveness check.
    Test,
    Exit,
    Tool(Tool),
    /// Toggle grid lines.
    Grid,
    Unknown(String),
}

impl Command {
    /// Parses one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Command> {
        let mut words = line.split_whitespace();
        let head = words.next()?;

        let cmd = match head.to_ascii_lowercase().as_str() {
            "test" => Command::Test,
            "exit" | "quit" => Command::Exit,
            "grid" => Command::Grid,
            "tool" => match words.next().and_then(Tool::from_name) {
                Some(tool) => Command::Tool(tool),
                None => Command::Unknown(line.trim().to_string()),
            },
            _ => Command::Unknown(line.trim().to_string()),
        };
        Some(cmd)
    }
}

/// Mutex-guarded FIFO shared between the console thread and the main loop.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<Command>>>,
}

impl CommandQueue {
    pub fn push(&self, cmd: Command) {
        self.lock().push_back(cmd);
    }

    /// Removes and returns every queued command in arrival order.
    pub fn drain(&self) -> Vec<Command> {
        self.lock().drain(..).collect()
    }

    // A panicking producer leaves the deque intact; keep using it.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Command>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the stdin reader thread.
pub struct Console {
    running: Arc<AtomicBool>,
}

impl Console {
    pub fn start(queue: CommandQueue) -> io::Result<Console> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        thread::Builder::new()
            .name("dungeon-console".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                read_commands(stdin.lock(), &queue, &flag);
                log::debug!("console thread finished");
            })?;

        log::info!("console ready (commands: test, exit, tool <cursor|brush>, grid)");
        Ok(Console { running })
    }

    /// Asks the reader to stop after its current line.
    ///
    /// The thread is not joined: it may be blocked on stdin until the process
    /// exits.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Reads lines from `reader` into `queue` until EOF, `exit`, or `running`
/// is cleared.
fn read_commands<R: BufRead>(reader: R, queue: &CommandQueue, running: &AtomicBool) {
    for line in reader.lines() {
        if !running.load(Ordering::Relaxed) {
            break;
        }
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("console read failed: {e}");
                break;
            }
        };

        let Some(cmd) = Command::parse(&line) else { continue };
        if let Command::Unknown(text) = &cmd {
            log::warn!("unknown command: {text}");
            continue;
        }

        let exit = cmd == Command::Exit;
        queue.push(cmd);
        if exit {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("test"), Some(Command::Test));
        assert_eq!(Command::parse("  EXIT "), Some(Command::Exit));
        assert_eq!(Command::parse("grid"), Some(Command::Grid));
        assert_eq!(Command::parse("tool brush"), Some(Command::Tool(Tool::TileBrush)));
        assert_eq!(Command::parse("tool cursor"), Some(Command::Tool(Tool::Cursor)));
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(Command::parse("   "), None);
        assert_eq!(Command::parse("fly away"), Some(Command::Unknown("fly away".into())));
        assert_eq!(Command::parse("tool hammer"), Some(Command::Unknown("tool hammer".into())));
        assert_eq!(Command::parse("tool"), Some(Command::Unknown("tool".into())));
    }

    // ── queue ─────────────────────────────────────────────────────────────

    #[test]
    fn queue_drains_in_order() {
        let q = CommandQueue::default();
        let producer = q.clone();
        producer.push(Command::Grid);
        producer.push(Command::Test);

        assert_eq!(q.drain(), vec![Command::Grid, Command::Test]);
        assert!(q.drain().is_empty());
    }

    #[test]
    fn queue_is_shared_across_threads() {
        let q = CommandQueue::default();
        let producer = q.clone();
        thread::spawn(move || producer.push(Command::Exit))
            .join()
            .unwrap();
        assert_eq!(q.drain(), vec![Command::Exit]);
    }

    // ── reader ────────────────────────────────────────────────────────────

    #[test]
    fn reader_skips_unknown_and_stops_at_exit() {
        let q = CommandQueue::default();
        let running = AtomicBool::new(true);
        let input = "test\n\nnonsense\ngrid\nexit\ngrid\n";

        read_commands(input.as_bytes(), &q, &running);

        assert_eq!(q.drain(), vec![Command::Test, Command::Grid, Command::Exit]);
    }

    #[test]
    fn reader_honours_stop_flag() {
        let q = CommandQueue::default();
        let running = AtomicBool::new(false);

        read_commands("test\n".as_bytes(), &q, &running);

        assert!(q.drain().is_empty());
    }
}
