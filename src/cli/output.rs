//! Terminal output helpers.
//!
//! Everything here writes to **stderr**: stdout is reserved for secret
//! values so `securestore get NAME | app` stays clean. Styling goes
//! through `console`, which drops the colors when stderr is not a
//! terminal.

use console::style;

/// Print a green success message.
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message.
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}
