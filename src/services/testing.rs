use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use serde_json::{Value, json};

use crate::error::ApiError;
use crate::services::lookup::ServiceApi;
use crate::services::model::Service;

const API_HOST: &str = "http://rancher.test/v1";

/// In-memory service whose state follows a script: every fetch consumes the
/// next state, the last one repeats forever.
pub struct ScriptedApi {
    states: RefCell<VecDeque<&'static str>>,
    fetches: Cell<usize>,
    invoked: RefCell<Vec<(String, Option<Value>)>>,
    launch_config: Value,
    advertise_actions: bool,
}

impl ScriptedApi {
    pub fn new(states: &[&'static str]) -> Self {
        ScriptedApi {
            states: RefCell::new(states.iter().copied().collect()),
            fetches: Cell::new(0),
            invoked: RefCell::new(Vec::new()),
            launch_config: json!({
                "imageUuid": "docker:registry.local/web:1.0",
                "environment": {"MODE": "prod", "REPLICA": "1"},
                "ports": ["8080:80/tcp"]
            }),
            advertise_actions: true,
        }
    }

    pub fn without_actions(mut self) -> Self {
        self.advertise_actions = false;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }

    pub fn invoked_urls(&self) -> Vec<String> {
        self.invoked
            .borrow()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn invoked_actions(&self) -> Vec<String> {
        self.invoked_urls()
            .iter()
            .filter_map(|url| url.split("action=").nth(1).map(str::to_string))
            .collect()
    }

    pub fn body_of(&self, action: &str) -> Option<Value> {
        self.invoked
            .borrow()
            .iter()
            .find(|(url, _)| url.ends_with(&format!("action={action}")))
            .and_then(|(_, body)| body.clone())
    }

    fn next_state(&self) -> &'static str {
        let mut states = self.states.borrow_mut();
        if states.len() > 1 {
            states.pop_front().unwrap_or("active")
        } else {
            states.front().copied().unwrap_or("active")
        }
    }

    fn actions_for(&self, state: &str) -> Value {
        if !self.advertise_actions {
            return json!({});
        }
        let action = |name: &str| format!("{API_HOST}/services/1s1/?action={name}");
        match state {
            "active" => json!({"upgrade": action("upgrade"), "deactivate": action("deactivate")}),
            "upgraded" => json!({
                "rollback": action("rollback"),
                "finishupgrade": action("finishupgrade")
            }),
            _ => json!({}),
        }
    }
}

impl ServiceApi for ScriptedApi {
    async fn service(&self, id: &str) -> Result<Service, ApiError> {
        self.fetches.set(self.fetches.get() + 1);
        let state = self.next_state();
        Ok(serde_json::from_value(json!({
            "id": id,
            "name": "web",
            "state": state,
            "kind": "service",
            "launchConfig": self.launch_config,
            "actions": self.actions_for(state),
        }))?)
    }

    async fn invoke(&self, url: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.invoked
            .borrow_mut()
            .push((url.to_string(), body.cloned()));
        Ok(json!({"id": "1s1"}))
    }

    fn action_endpoint(&self, id: &str, action: &str) -> String {
        format!("{API_HOST}/services/{id}?action={action}")
    }
}
