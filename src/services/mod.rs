use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use serde_json::Value;

use crate::client::ApiClient;
use crate::{default_spinner, print_json};

pub mod lookup;
pub mod model;
pub mod rollback;
pub mod transition;
pub mod upgrade;

#[cfg(test)]
mod testing;

use transition::PollSettings;
use upgrade::{EnvReplacement, UpgradeOptions};

fn service_id_arg(help: &'static str) -> Arg {
    Arg::new("service_id").help(help).required(true).index(1)
}

fn timeout_arg(help: &'static str) -> Arg {
    Arg::new("timeout")
        .help(help)
        .long("timeout")
        .short('t')
        .value_parser(clap::value_parser!(u64))
        .default_value("60")
}

pub fn commands() -> Vec<Command> {
    vec![
        Command::new("query")
            .about("Retrieve the service information. Without an ID, all services are retrieved")
            .arg(
                Arg::new("service_id")
                    .help("The ID of the service to read")
                    .index(1),
            )
            .arg(
                Arg::new("name")
                    .help("Only retrieve services with this name")
                    .long("name")
                    .short('n')
                    .conflicts_with("service_id"),
            ),
        Command::new("id_of")
            .alias("id-of")
            .about("Retrieve the IDs of the services with the given name")
            .arg(
                Arg::new("name")
                    .help("The name of the service to look up")
                    .required(true)
                    .index(1),
            ),
        Command::new("service_action")
            .alias("service-action")
            .about("Take an action on a service")
            .arg(service_id_arg("The ID of the service to act on"))
            .arg(
                Arg::new("action")
                    .help("The action to invoke, e.g. 'activate' or 'deactivate'")
                    .required(true)
                    .index(2),
            ),
        Command::new("get_service_blue_green")
            .alias("get-service-blue-green")
            .about("List the services of a blue-green deployment")
            .arg(
                Arg::new("name")
                    .help("The name of the service to look up")
                    .required(true)
                    .index(1),
            ),
        Command::new("upgrade")
            .about("Upgrade a service, keeping its configuration but pulling the image and replacing its containers")
            .arg(service_id_arg("The ID of the service to upgrade"))
            .arg(
                Arg::new("start_first")
                    .help("Start the new instance before stopping the old one")
                    .long("start-first")
                    .value_parser(clap::value_parser!(bool))
                    .default_value("true"),
            )
            .arg(
                Arg::new("complete_previous")
                    .help("Finish a previous, uncompleted upgrade before upgrading")
                    .long("complete-previous")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("auto_complete")
                    .help("Finish the upgrade automatically once it is done")
                    .long("auto-complete")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("image_uuid")
                    .help("Use a new image, in the 'docker:<image>:<tag>' format")
                    .long("image-uuid")
                    .alias("imageUuid")
                    .value_name("IMAGE"),
            )
            .arg(
                Arg::new("batch_size")
                    .help("Number of containers replaced per batch")
                    .long("batch-size")
                    .value_parser(clap::value_parser!(u32).range(1..))
                    .default_value("1"),
            )
            .arg(
                Arg::new("interval_millis")
                    .help("Milliseconds to wait between batches")
                    .long("interval-millis")
                    .value_parser(clap::value_parser!(u64))
                    .default_value("10000"),
            )
            .arg(
                Arg::new("replace_env_name")
                    .help("Name of an existing environment variable to change")
                    .long("replace-env-name")
                    .requires("replace_env_value"),
            )
            .arg(
                Arg::new("replace_env_value")
                    .help("New value of the environment variable")
                    .long("replace-env-value")
                    .requires("replace_env_name"),
            )
            .arg(timeout_arg("Seconds to wait before the upgrade is considered failed")),
        Command::new("rollback")
            .about("Roll an upgraded service back")
            .arg(service_id_arg("The ID of the service to roll back"))
            .arg(timeout_arg("Seconds to wait before the rollback is considered failed")),
    ]
}

pub async fn handle(client: &ApiClient<'_>, name: &str, args: &clap::ArgMatches) -> Result<()> {
    match name {
        "query" => {
            query(
                client,
                args.get_one::<String>("service_id").map(String::as_str),
                args.get_one::<String>("name").map(String::as_str),
            )
            .await
        }
        "id_of" => {
            let name = args.get_one::<String>("name").unwrap();
            print_json(&client.resolve_ids(name).await?)
        }
        "service_action" => {
            let service_id = args.get_one::<String>("service_id").unwrap();
            let action = args.get_one::<String>("action").unwrap();
            let url = lookup::ServiceApi::action_endpoint(client, service_id, action);
            print_json(&client.post(&url, None).await?)
        }
        "get_service_blue_green" => {
            let name = args.get_one::<String>("name").unwrap();
            print_json(&client.list_blue_green_siblings(name).await?)
        }
        "upgrade" => {
            let service_id = args.get_one::<String>("service_id").unwrap();
            let options = upgrade_options(args);
            let settings = PollSettings::with_timeout(*args.get_one::<u64>("timeout").unwrap());

            let progress = default_spinner();
            let result = upgrade::upgrade(client, service_id, &options, &settings, &progress).await;
            progress.finish_and_clear();
            let service = result?;
            if service.state == model::ACTIVE_STATE {
                println!("DONE");
            }
            Ok(())
        }
        "rollback" => {
            let service_id = args.get_one::<String>("service_id").unwrap();
            let settings = PollSettings::with_timeout(*args.get_one::<u64>("timeout").unwrap());

            let progress = default_spinner();
            let result = rollback::rollback(client, service_id, &settings, &progress).await;
            progress.finish_and_clear();
            result?;
            println!("Rolled back");
            Ok(())
        }
        _ => Err(anyhow::anyhow!("Unknown service command: {name}")),
    }
}

fn upgrade_options(args: &clap::ArgMatches) -> UpgradeOptions {
    let replace_env = match (
        args.get_one::<String>("replace_env_name"),
        args.get_one::<String>("replace_env_value"),
    ) {
        (Some(name), Some(value)) => Some(EnvReplacement {
            name: name.clone(),
            value: value.clone(),
        }),
        _ => None,
    };

    UpgradeOptions {
        batch_size: *args.get_one::<u32>("batch_size").unwrap(),
        interval_millis: *args.get_one::<u64>("interval_millis").unwrap(),
        start_first: *args.get_one::<bool>("start_first").unwrap(),
        complete_previous: args.get_flag("complete_previous"),
        auto_complete: args.get_flag("auto_complete"),
        image_uuid: args.get_one::<String>("image_uuid").cloned(),
        replace_env,
    }
}

/// Print one service, all services, or the services called `name`, with
/// every field the API returned.
pub async fn query(
    client: &ApiClient<'_>,
    service_id: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    match (service_id, name) {
        (Some(id), _) => {
            let service: Value = client.get(&client.service_url(Some(id))).await?;
            print_json(&service)
        }
        (None, Some(name)) => print_json(&client.fetch_by_name::<Value>(name).await?),
        (None, None) => print_json(&client.fetch_all::<Value>().await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<clap::ArgMatches, clap::Error> {
        Command::new("test")
            .subcommands(commands())
            .try_get_matches_from(std::iter::once("test").chain(args.iter().copied()))
    }

    #[test]
    fn upgrade_flags_map_to_options() {
        let matches = parse(&[
            "upgrade",
            "1s1",
            "--start-first",
            "false",
            "--batch-size",
            "3",
            "--interval-millis",
            "5000",
            "--imageUuid",
            "docker:web:2",
            "--auto-complete",
        ])
        .unwrap();
        let (_, args) = matches.subcommand().unwrap();

        assert_eq!(
            upgrade_options(args),
            UpgradeOptions {
                batch_size: 3,
                interval_millis: 5000,
                start_first: false,
                complete_previous: false,
                auto_complete: true,
                image_uuid: Some("docker:web:2".to_string()),
                replace_env: None,
            }
        );
    }

    #[test]
    fn upgrade_defaults() {
        let matches = parse(&["upgrade", "1s1"]).unwrap();
        let (_, args) = matches.subcommand().unwrap();

        assert_eq!(upgrade_options(args), UpgradeOptions::default());
        assert_eq!(args.get_one::<u64>("timeout"), Some(&60));
    }

    #[test]
    fn env_replacement_needs_name_and_value() {
        assert!(parse(&["upgrade", "1s1", "--replace-env-name", "MODE"]).is_err());

        let matches = parse(&[
            "upgrade",
            "1s1",
            "--replace-env-name",
            "MODE",
            "--replace-env-value",
            "canary",
        ])
        .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(
            upgrade_options(args).replace_env,
            Some(EnvReplacement {
                name: "MODE".to_string(),
                value: "canary".to_string(),
            })
        );
    }

    #[test]
    fn batch_size_must_be_positive() {
        assert!(parse(&["upgrade", "1s1", "--batch-size", "0"]).is_err());
    }

    #[test]
    fn snake_and_kebab_names_are_accepted() {
        assert!(parse(&["id_of", "web"]).is_ok());
        assert!(parse(&["id-of", "web"]).is_ok());
        assert!(parse(&["get-service-blue-green", "web"]).is_ok());
    }
}
