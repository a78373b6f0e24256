use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::services::model::{BlueGreenSibling, Collection, Container, Service};

const SERVICES_PATH: &str = "/services";

/// The slice of the API a state transition needs: read a service and
/// invoke one of its actions.
#[allow(async_fn_in_trait)]
pub trait ServiceApi {
    async fn service(&self, id: &str) -> Result<Service, ApiError>;

    async fn invoke(&self, url: &str, body: Option<&Value>) -> Result<Value, ApiError>;

    /// Generic `?action=` endpoint, for actions invoked without an
    /// advertised URL.
    fn action_endpoint(&self, id: &str, action: &str) -> String;
}

impl ServiceApi for ApiClient<'_> {
    async fn service(&self, id: &str) -> Result<Service, ApiError> {
        self.fetch_by_id(id).await
    }

    async fn invoke(&self, url: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.post(url, body).await
    }

    fn action_endpoint(&self, id: &str, action: &str) -> String {
        self.config()
            .url(&format!("{SERVICES_PATH}/{id}?action={action}"))
    }
}

impl ApiClient<'_> {
    pub fn service_url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => self.config().url(&format!("{SERVICES_PATH}/{id}")),
            None => self.config().url(SERVICES_PATH),
        }
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Service, ApiError> {
        match self.get(&self.service_url(Some(id))).await {
            Err(ApiError::NotFound(_)) => Err(ApiError::NotFound(format!("service {id}"))),
            other => other,
        }
    }

    /// Every service, decoded as `T`: a typed [`Service`] or the raw
    /// [`Value`] when all fields must be kept.
    pub async fn fetch_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, ApiError> {
        let collection: Collection<T> = self.get(&self.service_url(None)).await?;
        Ok(collection.data)
    }

    /// All services called `name`. Names are not unique.
    pub async fn fetch_by_name<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, ApiError> {
        let url = Url::parse_with_params(&self.service_url(None), &[("name", name)])
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let collection: Collection<T> = self.get(url.as_str()).await?;
        Ok(collection.data)
    }

    pub async fn resolve_ids(&self, name: &str) -> Result<Vec<String>, ApiError> {
        Ok(self
            .fetch_by_name::<Service>(name)
            .await?
            .into_iter()
            .map(|service| service.id)
            .collect())
    }

    pub async fn list_blue_green_siblings(
        &self,
        name: &str,
    ) -> Result<Vec<BlueGreenSibling>, ApiError> {
        self.fetch_by_name::<Service>(name)
            .await?
            .iter()
            .filter(|service| !service.is_load_balancer())
            .map(Service::to_sibling)
            .collect()
    }

    pub async fn instances(&self, service_id: &str) -> Result<Vec<Container>, ApiError> {
        let url = format!("{}/instances", self.service_url(Some(service_id)));
        let collection: Collection<Container> = self.get(&url).await?;
        Ok(collection.data)
    }
}
