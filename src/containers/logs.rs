use anyhow::Result;
use serde_json::json;

use crate::client::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Split a log frame into lines, routing `01 `/`02 ` prefixed lines to
/// stdout/stderr. Unprefixed lines go to stdout as they are.
pub fn frame_lines(frame: &str) -> impl Iterator<Item = (LogStream, &str)> {
    frame.lines().map(|line| {
        if let Some(rest) = line.strip_prefix("01 ") {
            (LogStream::Stdout, rest)
        } else if let Some(rest) = line.strip_prefix("02 ") {
            (LogStream::Stderr, rest)
        } else {
            (LogStream::Stdout, line)
        }
    })
}

pub async fn logs(
    client: &ApiClient<'_>,
    service_id: &str,
    lines: u32,
    follow: bool,
) -> Result<()> {
    let container = super::first_container(client, service_id).await?;
    println!("Showing logs of container '{}'", container.display_name());

    let payload = json!({"follow": follow, "lines": lines});
    let socket_url = super::open_session(client, &container, "logs", &payload).await?;

    client
        .stream_frames(&socket_url, |frame| {
            for (stream, line) in frame_lines(frame) {
                match stream {
                    LogStream::Stdout => println!("{line}"),
                    LogStream::Stderr => eprintln!("{line}"),
                }
            }
        })
        .await?;

    println!("DONE");
    Ok(())
}
