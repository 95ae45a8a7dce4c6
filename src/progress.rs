// Progress indicator: runs a blocking function on the calling thread while a
// renderer thread animates a spinner, then replaces the spinner with a final
// status line.
//
// The only thing shared between the two threads is a one-slot channel that
// carries the function's outcome from the caller to the renderer. The caller
// joins the renderer before returning, so the final line is always written
// after the function returned and before the caller continues.

use crate::output::{Output, Sink};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt::Display;
use std::io::Write;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);
// indicatif keeps the last char for the finished state
const FRAMES: &str = "⣾⣽⣻⢿⡿⣟⣯⣷ ";
const TEXT_DONE: &str = "done";
const TEXT_FAILED: &str = "failed";

/// Text around the animation. All empty in silent mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Framing {
    initial: String,
    done: String,
    failed: String,
}

impl Framing {
    fn labeled(text: &str) -> Self {
        Framing {
            initial: format!("{} ", text),
            done: format!("{} {}\n", text, TEXT_DONE),
            failed: format!("{} {}\n", text, TEXT_FAILED),
        }
    }
}

/// Runs `f` behind a spinner prefixed with `text`, ending with
/// `<text> done` or `<text> failed`.
///
/// On failure the error is reported as `Error: <error>` on the error sink
/// and `None` is returned; callers should not report it again.
pub fn spinner<T, E, F>(output: &mut Output, text: &str, f: F) -> Option<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    loading(output, Framing::labeled(text), f)
}

/// Like `spinner` but without any text: only the animation is shown.
pub fn waiting<T, E, F>(output: &mut Output, f: F) -> Option<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    loading(output, Framing::default(), f)
}

fn loading<T, E, F>(output: &mut Output, framing: Framing, f: F) -> Option<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let interactive = output.is_interactive();
    let sink = output.error_sink();
    let (completion, received) = mpsc::sync_channel::<Option<String>>(1);

    let result = thread::scope(|scope| {
        let renderer = scope.spawn(move || render(sink, &framing, interactive, received));

        let result = f();
        let summary = result.as_ref().err().map(|e| e.to_string());
        // The renderer only stops once it receives this, so a failed send
        // means it already died and there is nothing left to notify.
        let _ = completion.send(summary);
        if renderer.join().is_err() {
            tracing::warn!("progress renderer panicked");
        }
        result
    });

    match result {
        Ok(value) => Some(value),
        Err(e) => {
            output.error(e);
            None
        }
    }
}

fn render(sink: &mut Sink, framing: &Framing, interactive: bool, completion: Receiver<Option<String>>) {
    let target = if interactive {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    };
    let bar = ProgressBar::with_draw_target(None, target);
    bar.set_style(style());
    bar.set_prefix(framing.initial.clone());
    bar.tick();

    let failed = loop {
        match completion.recv_timeout(TICK) {
            Ok(error) => break error.is_some(),
            Err(RecvTimeoutError::Timeout) => bar.tick(),
            // Caller unwound without reporting
            Err(RecvTimeoutError::Disconnected) => break true,
        }
    };
    bar.finish_and_clear();

    let message = if failed { &framing.failed } else { &framing.done };
    if !message.is_empty() {
        let _ = sink.write_all(message.as_bytes());
        let _ = sink.flush();
    }
}

fn style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix}{spinner:.blue.bold}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(FRAMES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::capture;

    fn slow<T>(value: T) -> T {
        thread::sleep(Duration::from_millis(250));
        value
    }

    #[test]
    fn labeled_success_writes_done_once() {
        let (mut output, out, err) = capture();
        let observed = err.clone();

        let value = spinner(&mut output, "Sending document", || {
            let value = slow(42);
            // Nothing final may appear while the function is still running
            assert_eq!(observed.contents(), "");
            Ok::<_, String>(value)
        });

        assert_eq!(value, Some(42));
        assert_eq!(err.contents(), "Sending document done\n");
        assert_eq!(err.contents().matches("done").count(), 1);
        assert!(!err.contents().contains("failed"));
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn labeled_failure_writes_failed_once_and_reports() {
        let (mut output, out, err) = capture();

        let value: Option<()> = spinner(&mut output, "Sending document", || slow(Err("boom")));

        assert_eq!(value, None);
        assert_eq!(err.contents(), "Sending document failed\nError: boom\n");
        assert_eq!(err.contents().matches("failed").count(), 1);
        assert!(!err.contents().contains("done"));
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn silent_mode_has_no_framing() {
        let (mut output, _, err) = capture();
        assert_eq!(waiting(&mut output, || Ok::<_, String>("ok")), Some("ok"));
        assert_eq!(err.contents(), "");

        assert_eq!(waiting(&mut output, || Err::<(), _>("connection refused")), None);
        assert_eq!(err.contents(), "Error: connection refused\n");
    }

    #[test]
    fn immediate_return_still_completes() {
        let (mut output, _, err) = capture();
        for _ in 0..20 {
            spinner(&mut output, "x", || Ok::<_, String>(()));
        }
        assert_eq!(err.contents(), "x done\n".repeat(20));
    }

    #[test]
    fn spinner_cycles_through_every_frame() {
        let style = style();
        let shown: String = (0..8).map(|i| style.get_tick_str(i)).collect();
        assert_eq!(shown, "⣾⣽⣻⢿⡿⣟⣯⣷");
        assert_eq!(style.get_tick_str(8), "⣾");
        assert_eq!(style.get_final_tick_str(), " ");
    }

    #[test]
    fn framing_texts() {
        assert_eq!(
            Framing::labeled("Deploying"),
            Framing {
                initial: "Deploying ".into(),
                done: "Deploying done\n".into(),
                failed: "Deploying failed\n".into(),
            }
        );
        assert_eq!(Framing::default().done, "");
    }
}
