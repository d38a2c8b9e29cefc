use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::{self, Stdout, Write};
use std::panic;

use common::{actors::stop_requested, models::TradeSignal};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use storage::{LogEntry, StoreSnapshot};
use tokio::sync::watch;
use tracing::{debug, warn};

const RULE: &str = "------------------------------------------------------------";

/// Read-only render surface: redraws whenever the store or the log changes.
///
/// Owns the alternate screen for as long as [`TerminalView::run`] is running.
pub struct TerminalView<W = Stdout> {
    out: W,
    store_rx: watch::Receiver<StoreSnapshot>,
    log_rx: watch::Receiver<VecDeque<LogEntry>>,
}

impl TerminalView<Stdout> {
    pub fn new(
        store_rx: watch::Receiver<StoreSnapshot>,
        log_rx: watch::Receiver<VecDeque<LogEntry>>,
    ) -> Self {
        Self::with_writer(io::stdout(), store_rx, log_rx)
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn with_writer(
        out: W,
        store_rx: watch::Receiver<StoreSnapshot>,
        log_rx: watch::Receiver<VecDeque<LogEntry>>,
    ) -> Self {
        Self {
            out,
            store_rx,
            log_rx,
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if let Err(e) = execute!(self.out, EnterAlternateScreen, Hide) {
            warn!("Failed to enter alternate screen: {}", e);
        }

        loop {
            let frame = self.next_frame();
            if let Err(e) = self.draw(&frame) {
                warn!("Failed to draw dashboard: {}", e);
            }

            tokio::select! {
                _ = stop_requested(&mut shutdown) => break,
                changed = self.store_rx.changed() => if changed.is_err() { break },
                changed = self.log_rx.changed() => if changed.is_err() { break },
            }
        }

        if let Err(e) = execute!(self.out, Show, LeaveAlternateScreen) {
            warn!("Failed to restore terminal: {}", e);
        }
        debug!("Terminal view closed");
    }

    fn next_frame(&mut self) -> String {
        let snapshot = self.store_rx.borrow_and_update().clone();
        let lines: Vec<String> = self
            .log_rx
            .borrow_and_update()
            .iter()
            .map(ToString::to_string)
            .collect();
        render(&snapshot, &lines)
    }

    fn draw(&mut self, frame: &str) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}

/// Puts the cursor back and leaves the alternate screen before the default
/// panic message prints, so a crash never strands the tty.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));
}

pub fn restore_terminal() {
    let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
}

/// Builds one full frame: status header, signal feed, system log (newest last).
pub fn render(snapshot: &StoreSnapshot, log_lines: &[String]) -> String {
    let mut out = String::new();
    let status = if snapshot.is_connected {
        "ONLINE"
    } else {
        "OFFLINE"
    };

    let _ = writeln!(out, "SIGNAL ENGINE // DASHBOARD{:>34}", format!("Status: {}", status));
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "SIGNAL FEED");

    if snapshot.signals.is_empty() {
        let _ = writeln!(out, "  No active signals...");
    } else {
        for signal in &snapshot.signals {
            render_card(&mut out, signal);
        }
    }

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "SYSTEM LOG");
    for line in log_lines {
        let _ = writeln!(out, "  {}", line);
    }
    out
}

fn render_card(out: &mut String, signal: &TradeSignal) {
    let _ = writeln!(out, "  {:<12} [{}]", signal.token, signal.signal);
    let _ = writeln!(
        out,
        "    UIS Score {:.2} | Confidence {:.0}% | Expected Move {:+.2}%",
        signal.uis_score,
        signal.confidence.clamp(0.0, 100.0),
        signal.expected_move_pct
    );
    let _ = writeln!(out, "    | {}", signal.reason);
}
