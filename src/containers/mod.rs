use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use serde::Deserialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::services::model::Container;

mod exec;
mod logs;
mod start;

/// Socket handed out by the `execute` and `logs` actions.
#[derive(Debug, Deserialize)]
struct SocketSession {
    url: String,
    token: String,
}

impl SocketSession {
    fn socket_url(&self) -> String {
        format!("{}?token={}", self.url, self.token)
    }
}

pub fn commands() -> Vec<Command> {
    vec![
        Command::new("start_containers")
            .alias("start-containers")
            .about("Start the containers of a service, typically a start-once service")
            .arg(
                Arg::new("service_id")
                    .help("The ID of the service whose containers are started")
                    .required(true)
                    .index(1),
            ),
        Command::new("execute")
            .alias("exec")
            .about("Execute a command on one container of a service")
            .arg(
                Arg::new("service_id")
                    .help("The ID of the service to execute on")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("command")
                    .help("The command to execute, passed to /bin/sh -c")
                    .required(true)
                    .index(2),
            ),
        Command::new("logs")
            .alias("log")
            .about("Stream the logs of one container of a service")
            .arg(
                Arg::new("service_id")
                    .help("The ID of the service to show the logs of")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("lines")
                    .help("Number of past lines to show")
                    .long("lines")
                    .short('n')
                    .value_parser(clap::value_parser!(u32))
                    .default_value("100"),
            )
            .arg(
                Arg::new("no_follow")
                    .help("Stop after the past lines instead of following new output")
                    .long("no-follow")
                    .action(ArgAction::SetTrue),
            ),
    ]
}

pub async fn handle(client: &ApiClient<'_>, name: &str, args: &clap::ArgMatches) -> Result<()> {
    let service_id = args.get_one::<String>("service_id").unwrap();
    match name {
        "start_containers" => start::start_containers(client, service_id).await,
        "execute" => {
            let command = args.get_one::<String>("command").unwrap();
            exec::execute(client, service_id, command).await
        }
        "logs" => {
            let lines = *args.get_one::<u32>("lines").unwrap();
            let follow = !args.get_flag("no_follow");
            logs::logs(client, service_id, lines, follow).await
        }
        _ => Err(anyhow::anyhow!("Unknown container command: {name}")),
    }
}

/// The container commands act on the first container of the service.
async fn first_container(client: &ApiClient<'_>, service_id: &str) -> Result<Container> {
    client
        .instances(service_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No container available"))
}

/// Invoke a socket-producing action on `container` and return the socket URL.
async fn open_session(
    client: &ApiClient<'_>,
    container: &Container,
    action: &str,
    payload: &Value,
) -> Result<String> {
    let url = container.action_url(action)?;
    let response = client.post(url, Some(payload)).await?;
    let session: SocketSession = serde_json::from_value(response)
        .map_err(|e| anyhow::anyhow!("Unexpected response to '{action}': {e}"))?;
    Ok(session.socket_url())
}
