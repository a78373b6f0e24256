use anyhow::Result;

use crate::client::ApiClient;

pub async fn start_containers(client: &ApiClient<'_>, service_id: &str) -> Result<()> {
    let containers = client.instances(service_id).await?;
    if containers.is_empty() {
        println!("No containers found for service {service_id}");
        return Ok(());
    }

    for container in &containers {
        match container.action_url("start") {
            Ok(start_url) => {
                println!(
                    "Starting container {} with url {}",
                    container.display_name(),
                    start_url
                );
                client.post(start_url, None).await?;
            }
            Err(_) => log::warn!(
                "Container {} cannot be started in its current state, skipping",
                container.display_name()
            ),
        }
    }
    Ok(())
}
