//! Runs the binary against a wiremock server.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cli(server_uri: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rancher-services"));
    cmd.env("RANCHER_URL", server_uri)
        .env("RANCHER_ACCESS_KEY", "ak")
        .env("RANCHER_SECRET_KEY", "sk")
        .env_remove("CATTLE_URL")
        .env_remove("CATTLE_ACCESS_KEY")
        .env_remove("CATTLE_SECRET_KEY");
    cmd
}

#[test]
fn help_lists_commands() {
    Command::new(assert_cmd::cargo::cargo_bin!("rancher-services"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("upgrade"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("get_service_blue_green"));
}

#[tokio::test]
async fn query_prints_sorted_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/services/1s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "active",
            "id": "1s1",
            "name": "web"
        })))
        .mount(&server)
        .await;

    cli(&server.uri())
        .args(["query", "1s1"])
        .assert()
        .success()
        .stdout("{\n   \"id\": \"1s1\",\n   \"name\": \"web\",\n   \"state\": \"active\"\n}\n");
}

#[tokio::test]
async fn query_is_the_default_command() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    cli(&server.uri()).assert().success().stdout("[]\n");
}

#[tokio::test]
async fn query_by_name_keeps_every_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/services"))
        .and(query_param("name", "web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{
            "id": "1s1",
            "name": "web",
            "state": "active",
            "scale": 2
        }]})))
        .expect(1)
        .mount(&server)
        .await;

    cli(&server.uri())
        .args(["query", "--name", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scale\": 2"))
        .stdout(predicate::str::contains("\"id\": \"1s1\""));
}

#[tokio::test]
async fn rollback_of_active_service_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/services/1s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1s1",
            "name": "web",
            "state": "active",
            "actions": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    cli(&server.uri())
        .args(["rollback", "1s1", "--timeout", "4"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("current state: active"));
}

#[tokio::test]
async fn http_errors_exit_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/services/1s1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    cli(&server.uri())
        .args(["query", "1s1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"));
}
