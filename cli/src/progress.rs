use crossterm::{
    cursor::MoveToColumn,
    execute,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tilefuzz::{ProgressSnapshot, ProgressTracker};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const BAR_WIDTH: usize = 20;

/// Console progress bar redrawn from a helper thread
pub struct ProgressBar {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressBar {
    /// Start drawing unless `enabled` is false
    pub fn start(tracker: Arc<ProgressTracker>, prefix: &'static str, enabled: bool) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = enabled.then(|| {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    draw(prefix, &tracker.snapshot());
                    thread::sleep(POLL_INTERVAL);
                }
                draw(prefix, &tracker.snapshot());
                eprintln!();
            })
        });
        Self { stop, handle }
    }

    /// Draw the final state and release the line
    pub fn finish(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn draw(prefix: &str, snapshot: &ProgressSnapshot) {
    let mut stderr = io::stderr();
    let _ = execute!(
        stderr,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(render(prefix, snapshot))
    );
    let _ = stderr.flush();
}

fn render(prefix: &str, snapshot: &ProgressSnapshot) -> String {
    format!("{} {}{}", prefix, bar(snapshot.fraction), snapshot)
}

/// `[████▌_______________] 23.00%`
fn bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let full = ((fraction * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
    let half = ((fraction * (BAR_WIDTH * 2) as f64) as usize) % 2;
    let half = half.min(BAR_WIDTH - full);

    let mut bar = "█".repeat(full);
    bar.push_str(&"▌".repeat(half));
    bar.push_str(&"_".repeat(BAR_WIDTH - full - half));
    format!("[{}] {:.2}%", bar, fraction * 100.0)
}
