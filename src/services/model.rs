use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

pub const ACTIVE_STATE: &str = "active";
pub const UPGRADED_STATE: &str = "upgraded";

pub const LOAD_BALANCER_KIND: &str = "loadBalancerService";
pub const DEPLOYMENT_UNIT_LABEL: &str = "io.rancher.service.deployment.unit";

/// List responses wrap their items in `data`.
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: Option<String>,
    pub state: String,
    pub kind: Option<String>,
    pub launch_config: Option<LaunchConfig>,
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
    pub data: Option<ServiceData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceData {
    pub fields: Option<ServiceFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFields {
    pub launch_config: Option<LaunchConfig>,
}

/// Container runtime parameters of a service.
///
/// Only the keys this client edits are typed; everything else is carried in
/// `extra` so the config can be sent back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
}

/// Summary used to tell the blue and green variants of a service apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlueGreenSibling {
    pub state: String,
    pub id: String,
    #[serde(rename = "Deployment")]
    pub deployment_unit: String,
}

impl Service {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn is_load_balancer(&self) -> bool {
        self.kind.as_deref() == Some(LOAD_BALANCER_KIND)
    }

    /// URL advertised by the API for `action` in the current state.
    pub fn action_url(&self, action: &str) -> Result<&str, ApiError> {
        self.actions
            .get(action)
            .map(String::as_str)
            .ok_or_else(|| {
                ApiError::missing(format!("service {}", self.id), format!("actions.{action}"))
            })
    }

    pub fn deployment_unit(&self) -> Result<&str, ApiError> {
        self.data
            .as_ref()
            .and_then(|data| data.fields.as_ref())
            .and_then(|fields| fields.launch_config.as_ref())
            .and_then(|config| config.labels.as_ref())
            .and_then(|labels| labels.get(DEPLOYMENT_UNIT_LABEL))
            .map(String::as_str)
            .ok_or_else(|| {
                ApiError::missing(
                    format!("service {}", self.id),
                    format!("data.fields.launchConfig.labels.{DEPLOYMENT_UNIT_LABEL}"),
                )
            })
    }

    pub fn to_sibling(&self) -> Result<BlueGreenSibling, ApiError> {
        Ok(BlueGreenSibling {
            state: self.state.clone(),
            id: self.id.clone(),
            deployment_unit: self.deployment_unit()?.to_string(),
        })
    }
}

impl Container {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn action_url(&self, action: &str) -> Result<&str, ApiError> {
        self.actions
            .get(action)
            .map(String::as_str)
            .ok_or_else(|| {
                ApiError::missing(format!("container {}", self.id), format!("actions.{action}"))
            })
    }
}
