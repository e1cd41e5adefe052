/// Typewriter reveal: text shown one character at a time on a display surface.
///
/// A reveal runs as a tokio task. Starting a new reveal (or showing text
/// directly) cancels the running one first, so a surface never has two
/// writers: each task carries the epoch it was started in and re-checks it
/// under the surface lock before every write.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::session::Presenter;

/// Default reveal speed, on the 0–80 scale.
pub const DEFAULT_SPEED: u32 = 18;

/// Per-character delay for a speed setting: higher speed, shorter delay.
/// Speed 0 means "unset" and falls back to [`DEFAULT_SPEED`].
pub fn delay_for_speed(speed: u32) -> Duration {
    let speed = if speed == 0 { DEFAULT_SPEED } else { speed };
    Duration::from_millis(80u64.saturating_sub(u64::from(speed)))
}

/// Something that displays the currently revealed text.
pub trait DisplaySurface: Send + 'static {
    /// Replace whatever is shown with `text`.
    fn show(&mut self, text: &str);
}

/// Surface that records every frame it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub frames: Vec<String>,
}

impl RecordingSurface {
    /// The last frame shown, or `""`.
    pub fn current(&self) -> &str {
        self.frames.last().map(String::as_str).unwrap_or_default()
    }
}

impl DisplaySurface for RecordingSurface {
    fn show(&mut self, text: &str) {
        self.frames.push(text.to_string());
    }
}

/// Surface writing to a stream, emitting only the characters added since the
/// previous frame. A frame that is not an extension of the last one starts
/// on a fresh line.
#[derive(Debug)]
pub struct WriterSurface<W: Write + Send + 'static> {
    out: W,
    shown: String,
}

impl<W: Write + Send + 'static> WriterSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl WriterSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> DisplaySurface for WriterSurface<W> {
    fn show(&mut self, text: &str) {
        let result = match text.strip_prefix(self.shown.as_str()) {
            Some(added) => self.out.write_all(added.as_bytes()),
            None => {
                let sep: &[u8] = if self.shown.is_empty() { b"" } else { b"\n" };
                self.out
                    .write_all(sep)
                    .and_then(|_| self.out.write_all(text.as_bytes()))
            }
        };
        if let Err(e) = result.and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write reveal frame");
        }
        self.shown.clear();
        self.shown.push_str(text);
    }
}

fn lock<S>(surface: &Mutex<S>) -> MutexGuard<'_, S> {
    surface.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns a display surface and at most one running reveal task.
pub struct Typewriter<S: DisplaySurface> {
    surface: Arc<Mutex<S>>,
    epoch: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
    delay: Duration,
}

impl<S: DisplaySurface> Typewriter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface: Arc::new(Mutex::new(surface)),
            epoch: Arc::new(AtomicU64::new(0)),
            task: None,
            delay: delay_for_speed(DEFAULT_SPEED),
        }
    }

    /// Shared handle to the surface, e.g. to inspect what is shown.
    pub fn surface(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.surface)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn set_speed(&mut self, speed: u32) {
        self.delay = delay_for_speed(speed);
    }

    /// Whether a reveal is still writing to the surface.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the running reveal, if any. The surface keeps whatever it shows.
    pub fn cancel(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Cancel any reveal and show `text` at once.
    pub fn show_now(&mut self, text: &str) {
        self.cancel();
        lock(&self.surface).show(text);
    }

    /// Cancel any reveal, clear the surface, and reveal `text` one character
    /// per tick of the current delay.
    ///
    /// Must be called within a tokio runtime; outside one the text is shown
    /// at once instead.
    pub fn start(&mut self, text: String) {
        self.cancel();
        lock(&self.surface).show("");

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, showing text without reveal");
            lock(&self.surface).show(&text);
            return;
        };

        let mine = self.epoch.load(Ordering::SeqCst);
        let epoch = Arc::clone(&self.epoch);
        let surface = Arc::clone(&self.surface);
        let delay = self.delay;
        tracing::debug!(chars = text.chars().count(), ?delay, "starting reveal");

        self.task = Some(handle.spawn(async move {
            let ends: Vec<usize> = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
            for end in ends {
                tokio::time::sleep(delay).await;
                let mut guard = lock(&surface);
                if epoch.load(Ordering::SeqCst) != mine {
                    return;
                }
                guard.show(&text[..end]);
            }
        }));
    }

    /// Wait for the running reveal to finish.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "reveal task failed");
                }
            }
        }
    }
}

impl<S: DisplaySurface> Drop for Typewriter<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<S: DisplaySurface> Presenter for Typewriter<S> {
    fn present(&mut self, text: &str, animate: bool) {
        if animate {
            self.start(text.to_string());
        } else {
            self.show_now(text);
        }
    }

    fn clear(&mut self) {
        self.show_now("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(tw: &Typewriter<RecordingSurface>) -> String {
        lock(&tw.surface()).current().to_string()
    }

    #[test]
    fn speed_maps_to_delay() {
        assert_eq!(delay_for_speed(DEFAULT_SPEED), Duration::from_millis(62));
        assert_eq!(delay_for_speed(0), delay_for_speed(DEFAULT_SPEED));
        assert_eq!(delay_for_speed(1), Duration::from_millis(79));
        assert_eq!(delay_for_speed(200), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_one_character_per_tick() {
        let mut tw = Typewriter::new(RecordingSurface::default());
        tw.set_delay(Duration::from_millis(10));
        tw.start("héllo".to_string());
        assert!(tw.is_running());
        tw.wait().await;

        let frames = lock(&tw.surface()).frames.clone();
        assert_eq!(frames, vec!["", "h", "hé", "hél", "héll", "héllo"]);
        assert!(!tw.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn new_reveal_supersedes_running_one() {
        let mut tw = Typewriter::new(RecordingSurface::default());
        tw.set_delay(Duration::from_millis(10));
        tw.start("first story".to_string());
        tokio::time::sleep(Duration::from_millis(35)).await;
        let partial = current(&tw);
        assert!(!partial.is_empty() && "first story".starts_with(partial.as_str()));

        tw.start("second".to_string());
        tw.wait().await;
        // Let any stale task run; it must not write again.
        tokio::time::sleep(Duration::from_millis(500)).await;

        let frames = lock(&tw.surface()).frames.clone();
        let restart = frames.iter().rposition(|f| f.is_empty()).unwrap();
        assert_eq!(&frames[restart..], &["", "s", "se", "sec", "seco", "secon", "second"]);
        assert_eq!(current(&tw), "second");
    }

    #[tokio::test(start_paused = true)]
    async fn show_now_cancels_reveal() {
        let mut tw = Typewriter::new(RecordingSurface::default());
        tw.set_delay(Duration::from_millis(10));
        tw.start("a long reveal".to_string());
        tokio::time::sleep(Duration::from_millis(25)).await;
        tw.show_now("done");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(current(&tw), "done");
        assert!(!tw.is_running());
    }

    #[test]
    fn start_outside_runtime_shows_text() {
        let mut tw = Typewriter::new(RecordingSurface::default());
        tw.start("plain".to_string());
        assert_eq!(current(&tw), "plain");
        assert!(!tw.is_running());
    }

    #[test]
    fn writer_surface_emits_only_new_characters() {
        let mut surface = WriterSurface::new(Vec::new());
        surface.show("");
        surface.show("ab");
        surface.show("abc");
        surface.show("");
        surface.show("x");
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert_eq!(out, "abc\nx");
    }
}
