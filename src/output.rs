// Output context: the standard and error sinks plus terminal capabilities,
// built once per invocation and passed to every command.

use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::fmt::Display;
use std::io::{self, Write};

pub type Sink = Box<dyn Write + Send>;

pub struct Output {
    out: Sink,
    err: Sink,
    color: Colors,
    interactive: bool,
}

/// Whether each sink gets colour; they may go to different places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Colors {
    pub out: bool,
    pub err: bool,
}

impl Output {
    pub fn new(out: Sink, err: Sink, color: Colors, interactive: bool) -> Self {
        Output {
            out,
            err,
            color,
            interactive,
        }
    }

    /// Stdout and stderr. Each sink is coloured only when it is a terminal,
    /// and the progress animation follows stderr being one.
    pub fn terminal(no_color: bool) -> Self {
        let color = Colors {
            out: !no_color && io::stdout().is_tty(),
            err: !no_color && io::stderr().is_tty(),
        };
        let interactive = io::stderr().is_tty();
        Output::new(Box::new(io::stdout()), Box::new(io::stderr()), color, interactive)
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Writes `Success: <message>` to the standard sink.
    pub fn success(&mut self, message: impl Display) {
        let prefix = if self.color.out {
            "Success:".green().bold().to_string()
        } else {
            "Success:".to_string()
        };
        line(&mut self.out, format_args!("{} {}", prefix, message));
    }

    /// Writes `Error: <message>` to the error sink.
    pub fn error(&mut self, message: impl Display) {
        let prefix = error_prefix(self.color.err);
        line(&mut self.err, format_args!("{} {}", prefix, message));
    }

    /// Writes a plain line to the standard sink.
    pub fn print(&mut self, message: impl Display) {
        line(&mut self.out, format_args!("{}", message));
    }

    /// Wraps a fragment for the standard sink in the given colour when that
    /// sink is coloured.
    pub fn highlight(&self, text: &str, color: crossterm::style::Color) -> String {
        paint(text, color, self.color.out)
    }

    /// Like `highlight`, for fragments of an error message.
    pub fn highlight_error(&self, text: &str, color: crossterm::style::Color) -> String {
        paint(text, color, self.color.err)
    }

    /// The error sink, lent to the progress renderer while it runs.
    pub(crate) fn error_sink(&mut self) -> &mut Sink {
        &mut self.err
    }
}

fn paint(text: &str, color: crossterm::style::Color, enabled: bool) -> String {
    if enabled {
        text.with(color).to_string()
    } else {
        text.to_string()
    }
}

fn error_prefix(color: bool) -> String {
    if color {
        "Error:".red().bold().to_string()
    } else {
        "Error:".to_string()
    }
}

// Output failures (closed pipe and the like) are not reportable anywhere.
fn line(sink: &mut Sink, args: std::fmt::Arguments<'_>) {
    let _ = writeln!(sink, "{}", args);
    let _ = sink.flush();
}
