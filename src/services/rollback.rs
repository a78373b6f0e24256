use indicatif::ProgressBar;

use crate::services::lookup::ServiceApi;
use crate::services::model::Service;
use crate::services::transition::{self, PollSettings, ROLLBACK, TransitionError};

/// Roll an `upgraded` service back to its previous launch config.
pub async fn rollback<A: ServiceApi>(
    api: &A,
    service_id: &str,
    settings: &PollSettings,
    progress: &ProgressBar,
) -> Result<Service, TransitionError> {
    let service = api.service(service_id).await?;
    transition::run(api, &service, &ROLLBACK, None, settings, progress).await
}
