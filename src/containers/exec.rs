use anyhow::Result;
use serde_json::{Value, json};

use crate::client::ApiClient;

fn exec_payload(command: &str) -> Value {
    json!({
        "attachStdin": true,
        "attachStdout": true,
        "command": ["/bin/sh", "-c", command],
        "tty": true
    })
}

pub async fn execute(client: &ApiClient<'_>, service_id: &str, command: &str) -> Result<()> {
    let container = super::first_container(client, service_id).await?;
    println!(
        "Executing '{}' on container '{}'",
        command,
        container.display_name()
    );

    let socket_url =
        super::open_session(client, &container, "execute", &exec_payload(command)).await?;
    let output = client.read_socket(&socket_url).await?;

    println!("> \n{}", String::from_utf8_lossy(&output));
    println!("DONE");
    Ok(())
}
