use clap::{Arg, Command};
use reqwest::Client;
use rancher_services::client::ApiClient;
use rancher_services::config::CliConfig;
use rancher_services::{containers, services};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Query, upgrade and roll back Rancher services")
        .subcommand_required(false)
        .arg(
            Arg::new("url")
                .help("API URL, overrides CATTLE_URL and RANCHER_URL")
                .long("url")
                .global(true),
        )
        .arg(
            Arg::new("access_key")
                .help("API access key, overrides CATTLE_ACCESS_KEY and RANCHER_ACCESS_KEY")
                .long("access-key")
                .global(true),
        )
        .arg(
            Arg::new("secret_key")
                .help("API secret key, overrides CATTLE_SECRET_KEY and RANCHER_SECRET_KEY")
                .long("secret-key")
                .global(true),
        )
        .subcommands(services::commands())
        .subcommands(containers::commands())
        .get_matches();

    let config = CliConfig::init().with_overrides(
        matches.get_one::<String>("url"),
        matches.get_one::<String>("access_key"),
        matches.get_one::<String>("secret_key"),
    );
    let client = ApiClient::new(Client::new(), &config);

    // Match on the subcommands and handle logic
    let r = match matches.subcommand() {
        Some((name @ ("start_containers" | "execute" | "logs"), args)) => {
            containers::handle(&client, name, args).await
        }
        Some((name, args)) => services::handle(&client, name, args).await,
        None => services::query(&client, None, None).await,
    };

    if let Err(e) = r {
        log::debug!("Error: {e:?}");
        eprintln!("{} {}", console::style("error:").red().bold(), e);
        std::process::exit(1);
    }
}
