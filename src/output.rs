//! User-facing lines for the binary. Colour is used only when the stream is a TTY.

use owo_colors::{OwoColorize, Style};

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn is_tty(self) -> bool {
        match self {
            Stream::Stdout => atty::is(atty::Stream::Stdout),
            Stream::Stderr => atty::is(atty::Stream::Stderr),
        }
    }
}

fn emit(stream: Stream, label: &str, style: Style, msg: &str) {
    let line = if stream.is_tty() {
        format!("{} {msg}", label.style(style))
    } else {
        format!("{label} {msg}")
    };
    match stream {
        Stream::Stdout => println!("{line}"),
        Stream::Stderr => eprintln!("{line}"),
    }
}

pub fn print_info(msg: &str) {
    emit(Stream::Stdout, "info:", Style::new().cyan().bold(), msg);
}

pub fn print_warn(msg: &str) {
    emit(Stream::Stderr, "warn:", Style::new().yellow().bold(), msg);
}

pub fn print_error(msg: &str) {
    emit(Stream::Stderr, "error:", Style::new().red().bold(), msg);
}

pub fn print_success(msg: &str) {
    emit(Stream::Stdout, "ok:", Style::new().green().bold(), msg);
}

/// Plain line without prefix, for output users may script against
/// (e.g. `copied 1:/a.txt -> 2:/in/a.txt`).
pub fn print_user(msg: &str) {
    println!("{msg}");
}
