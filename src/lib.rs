use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

pub mod client;
pub mod config;
pub mod containers;
pub mod error;
pub mod services;

pub fn default_spinner() -> ProgressBar {
    let spinner_style = ProgressStyle::with_template("{spinner} {prefix:.bold.dim} {wide_msg}")
        .unwrap()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

    let progress = ProgressBar::new_spinner();
    progress.set_style(spinner_style);
    progress.enable_steady_tick(std::time::Duration::from_millis(50));
    progress
}

/// Print a status line on stdout without tearing the spinner's current frame.
pub fn print_above(progress: &ProgressBar, message: impl AsRef<str>) {
    progress.suspend(|| println!("{}", message.as_ref()));
}

/// Pretty print `value` as JSON with sorted keys and a three space indent.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", to_pretty_json(value)?);
    Ok(())
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    // Round trip through Value so object keys come out sorted.
    let value = serde_json::to_value(value)?;
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
