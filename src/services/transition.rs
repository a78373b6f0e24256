use std::future::Future;
use std::time::Duration;

use indicatif::ProgressBar;
use serde_json::Value;

use crate::error::ApiError;
use crate::print_above;
use crate::services::lookup::ServiceApi;
use crate::services::model::{ACTIVE_STATE, Service, UPGRADED_STATE};

/// Fixed wait between two polls of a transitioning service.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// States a service never leaves on its own. Reaching one of them while
/// waiting for a different state ends the wait immediately.
pub const FAILURE_STATES: [&str; 3] = ["error", "removed", "purged"];

/// A server side state change started by invoking one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub operation: &'static str,
    pub action: &'static str,
    pub precondition: &'static str,
    pub target: &'static str,
    /// Post to the generic `?action=` endpoint when the service does not
    /// advertise the action.
    pub fallback_endpoint: bool,
}

pub const UPGRADE: Transition = Transition {
    operation: "Upgrade",
    action: "upgrade",
    precondition: ACTIVE_STATE,
    target: UPGRADED_STATE,
    fallback_endpoint: false,
};

pub const FINISH_UPGRADE: Transition = Transition {
    operation: "Finish upgrade",
    action: "finishupgrade",
    precondition: UPGRADED_STATE,
    target: ACTIVE_STATE,
    fallback_endpoint: true,
};

pub const ROLLBACK: Transition = Transition {
    operation: "Rollback",
    action: "rollback",
    precondition: UPGRADED_STATE,
    target: ACTIVE_STATE,
    fallback_endpoint: false,
};

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error(
        "Service {service} cannot be {} due to its current state: {state} (expected {expected})",
        verb(.operation)
    )]
    Precondition {
        operation: &'static str,
        service: String,
        state: String,
        expected: &'static str,
    },

    #[error(
        "{operation} of {service} did not reach '{target}' within {}s (last state: {state}). Check Rancher UI for more details.",
        .waited.as_secs()
    )]
    Timeout {
        operation: &'static str,
        service: String,
        target: &'static str,
        state: String,
        waited: Duration,
    },

    #[error("{operation} of {service} failed: service entered state '{state}'")]
    Failed {
        operation: &'static str,
        service: String,
        state: String,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn verb(operation: &str) -> &'static str {
    match operation {
        "Rollback" => "rolled back",
        "Finish upgrade" => "finished",
        _ => "upgraded",
    }
}

/// How long and how often to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn with_timeout(timeout_secs: u64) -> Self {
        PollSettings {
            interval: POLL_INTERVAL,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Number of polls that fit into the timeout.
    pub fn attempts(&self) -> u64 {
        let interval = self.interval.as_millis().max(1);
        u64::try_from(self.timeout.as_millis() / interval).unwrap_or(u64::MAX)
    }

    /// Time spent sleeping when every attempt is used.
    pub fn budget(&self) -> Duration {
        let interval = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(interval.saturating_mul(self.attempts()))
    }
}

/// Result of a single check inside [`poll_until`].
pub enum Check<T> {
    Done(T),
    Pending(T),
    Failed(T),
}

pub enum PollOutcome<T> {
    Reached(T),
    Failed(T),
    /// Carries the last pending value, if any check ran.
    TimedOut(Option<T>),
}

/// Sleep `interval`, run `check`, repeat at most `attempts` times.
pub async fn poll_until<T, E, F, Fut>(
    interval: Duration,
    attempts: u64,
    mut check: F,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Check<T>, E>>,
{
    let mut last = None;
    for attempt in 1..=attempts {
        tokio::time::sleep(interval).await;
        match check(attempt).await? {
            Check::Done(value) => return Ok(PollOutcome::Reached(value)),
            Check::Failed(value) => return Ok(PollOutcome::Failed(value)),
            Check::Pending(value) => last = Some(value),
        }
    }
    Ok(PollOutcome::TimedOut(last))
}

pub fn require_state(service: &Service, transition: &Transition) -> Result<(), TransitionError> {
    if service.state == transition.precondition {
        return Ok(());
    }
    Err(TransitionError::Precondition {
        operation: transition.operation,
        service: service.display_name().to_string(),
        state: service.state.clone(),
        expected: transition.precondition,
    })
}

/// Invoke the transition's action on a freshly fetched `service`.
///
/// Only the URL advertised in the service's `actions` is used, unless the
/// transition allows the generic `?action=` endpoint.
pub async fn invoke<A: ServiceApi>(
    api: &A,
    service: &Service,
    transition: &Transition,
    body: Option<&Value>,
) -> Result<Value, TransitionError> {
    require_state(service, transition)?;
    let url = match service.action_url(transition.action) {
        Ok(url) => url.to_string(),
        Err(e) if !transition.fallback_endpoint => return Err(e.into()),
        Err(_) => {
            log::debug!(
                "No '{}' action advertised for {}, using action endpoint",
                transition.action,
                service.id
            );
            api.action_endpoint(&service.id, transition.action)
        }
    };
    Ok(api.invoke(&url, body).await?)
}

/// Poll `service_id` until it reaches the transition's target state.
pub async fn wait_for<A: ServiceApi>(
    api: &A,
    service_id: &str,
    transition: &Transition,
    settings: &PollSettings,
    progress: &ProgressBar,
) -> Result<Service, TransitionError> {
    progress.set_prefix(format!(
        "Waiting for {} to finish...",
        transition.operation.to_lowercase()
    ));

    let outcome = poll_until(settings.interval, settings.attempts(), |attempt| async move {
        let service = api.service(service_id).await?;
        log::debug!(
            "Poll {attempt}/{}: {} is '{}'",
            settings.attempts(),
            service_id,
            service.state
        );
        progress.set_message(format!("state: {}", service.state));

        Ok::<_, TransitionError>(if service.state == transition.target {
            Check::Done(service)
        } else if FAILURE_STATES.contains(&service.state.as_str()) {
            Check::Failed(service)
        } else {
            Check::Pending(service)
        })
    })
    .await?;

    match outcome {
        PollOutcome::Reached(service) => Ok(service),
        PollOutcome::Failed(service) => Err(TransitionError::Failed {
            operation: transition.operation,
            service: service.display_name().to_string(),
            state: service.state,
        }),
        PollOutcome::TimedOut(last) => Err(TransitionError::Timeout {
            operation: transition.operation,
            service: last
                .as_ref()
                .map_or(service_id, Service::display_name)
                .to_string(),
            target: transition.target,
            state: last.map_or_else(|| "unknown".to_string(), |service| service.state),
            waited: settings.budget(),
        }),
    }
}

/// Check, invoke, and wait: the whole protocol for one transition.
pub async fn run<A: ServiceApi>(
    api: &A,
    service: &Service,
    transition: &Transition,
    body: Option<&Value>,
    settings: &PollSettings,
    progress: &ProgressBar,
) -> Result<Service, TransitionError> {
    invoke(api, service, transition, body).await?;
    print_above(
        progress,
        format!(
            "{} of {} service started!",
            transition.operation,
            service.display_name()
        ),
    );
    wait_for(api, &service.id, transition, settings, progress).await
}
