use indicatif::ProgressBar;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::print_above;
use crate::services::lookup::ServiceApi;
use crate::services::model::{LaunchConfig, Service, UPGRADED_STATE};
use crate::services::transition::{self, FINISH_UPGRADE, PollSettings, TransitionError, UPGRADE};

pub const DEFAULT_BATCH_SIZE: u32 = 1;
pub const DEFAULT_INTERVAL_MILLIS: u64 = 10_000;
pub const DEFAULT_START_FIRST: bool = true;

/// Payload of the `upgrade` action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub in_service_strategy: InServiceStrategy,
}

/// Rolling, batched replacement of a service's containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InServiceStrategy {
    pub batch_size: u32,
    pub interval_millis: u64,
    /// Start the replacement before stopping the old container.
    pub start_first: bool,
    pub launch_config: LaunchConfig,
    pub secondary_launch_configs: Vec<Value>,
}

impl Default for InServiceStrategy {
    fn default() -> Self {
        InServiceStrategy {
            batch_size: DEFAULT_BATCH_SIZE,
            interval_millis: DEFAULT_INTERVAL_MILLIS,
            start_first: DEFAULT_START_FIRST,
            launch_config: LaunchConfig::default(),
            secondary_launch_configs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvReplacement {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOptions {
    pub batch_size: u32,
    pub interval_millis: u64,
    pub start_first: bool,
    /// Finish a pending upgrade before starting a new one.
    pub complete_previous: bool,
    /// Finish this upgrade once the service reports `upgraded`.
    pub auto_complete: bool,
    pub image_uuid: Option<String>,
    pub replace_env: Option<EnvReplacement>,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        UpgradeOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            interval_millis: DEFAULT_INTERVAL_MILLIS,
            start_first: DEFAULT_START_FIRST,
            complete_previous: false,
            auto_complete: false,
            image_uuid: None,
            replace_env: None,
        }
    }
}

impl InServiceStrategy {
    /// Build the strategy from `options` around a copy of the service's
    /// current launch config.
    pub fn for_service(
        service: &Service,
        options: &UpgradeOptions,
        progress: &ProgressBar,
    ) -> Result<Self, ApiError> {
        let mut launch_config = service
            .launch_config
            .clone()
            .ok_or_else(|| ApiError::missing(format!("service {}", service.id), "launchConfig"))?;

        if let Some(replacement) = &options.replace_env {
            let previous = launch_config
                .environment
                .as_mut()
                .and_then(|environment| environment.get_mut(&replacement.name))
                .ok_or_else(|| {
                    ApiError::missing(
                        format!("service {}", service.id),
                        format!("launchConfig.environment.{}", replacement.name),
                    )
                })?;
            print_above(
                progress,
                format!(
                    "Replacing environment variable {} from {} to {}",
                    replacement.name,
                    display_value(previous),
                    replacement.value
                ),
            );
            *previous = Value::String(replacement.value.clone());
        }

        if let Some(image) = &options.image_uuid {
            launch_config.image_uuid = Some(image.clone());
            print_above(progress, format!("New Image: {image}"));
        }

        Ok(InServiceStrategy {
            batch_size: options.batch_size,
            interval_millis: options.interval_millis,
            start_first: options.start_first,
            launch_config,
            ..InServiceStrategy::default()
        })
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Upgrade `service_id` in place and wait for it to settle.
///
/// Returns the service as last observed: `upgraded`, or `active` when the
/// upgrade was finished automatically.
pub async fn upgrade<A: ServiceApi>(
    api: &A,
    service_id: &str,
    options: &UpgradeOptions,
    settings: &PollSettings,
    progress: &ProgressBar,
) -> Result<Service, TransitionError> {
    let mut service = api.service(service_id).await?;

    if options.complete_previous && service.state == UPGRADED_STATE {
        print_above(progress, "Previous service upgrade wasn't completed, completing it now...");
        service = transition::run(api, &service, &FINISH_UPGRADE, None, settings, progress).await?;
    }

    transition::require_state(&service, &UPGRADE)?;

    let request = UpgradeRequest {
        in_service_strategy: InServiceStrategy::for_service(&service, options, progress)?,
    };
    let body = serde_json::to_value(&request).map_err(ApiError::from)?;

    let service =
        transition::run(api, &service, &UPGRADE, Some(&body), settings, progress).await?;
    print_above(progress, "Upgraded");

    if !options.auto_complete {
        return Ok(service);
    }

    print_above(progress, "Auto Finishing Upgrade...");
    transition::run(api, &service, &FINISH_UPGRADE, None, settings, progress).await
}
