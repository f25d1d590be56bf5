use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use httpmock::prelude::*;
use httpmock::Mock;
use inkwire_cli::{build_app, load_field_map, Cli};
use inkwire_webhook_runtime::hmac_sha256_hex;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const SECRET: &str = "integration-secret";
const FIELD_MAP: &str = r#"
title = "CF_TITLE"
summary = "CF_SUMMARY"
content = "CF_CONTENT"
media_type = "CF_MEDIA"
date_of_publication = "CF_DATE"
meta_description = "CF_META_DESC"
meta_title = "CF_META_TITLE"
identifier = "CF_IDENTIFIER"
creation_locked = "CF_LOCKED"
"#;

struct Bridge {
    base: String,
    _field_map_dir: tempfile::TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_bridge(wrike: &MockServer, dotcms: &MockServer) -> Bridge {
    let field_map_dir = tempfile::tempdir().expect("tempdir");
    let field_map_path: PathBuf = field_map_dir.path().join("field-map.toml");
    std::fs::write(&field_map_path, FIELD_MAP).expect("write field map");

    let wrike_base = wrike.url("/api/v4");
    let dotcms_base = dotcms.base_url();
    let field_map_arg = field_map_path.display().to_string();
    let cli = Cli::try_parse_from([
        "inkwire",
        "--wrike-api-base",
        wrike_base.as_str(),
        "--wrike-token",
        "wrike-token",
        "--wrike-bot-contact-id",
        "BOT1",
        "--webhook-secret",
        SECRET,
        "--dotcms-api-base",
        dotcms_base.as_str(),
        "--dotcms-token",
        "dotcms-token",
        "--dotcms-workflow-action-id",
        "create-action",
        "--field-map",
        field_map_arg.as_str(),
        "--task-fetch-delay-ms",
        "5",
        "--request-timeout-ms",
        "5000",
    ])
    .expect("parse cli");
    let field_map = load_field_map(&cli.field_map).expect("field map");
    let app = build_app(&cli, field_map).expect("app");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    tokio::time::sleep(Duration::from_millis(25)).await;
    Bridge {
        base: format!("http://{addr}"),
        _field_map_dir: field_map_dir,
        handle,
    }
}

async fn post_signed(bridge: &Bridge, events: Value) -> Value {
    let body = events.to_string();
    let signature = hmac_sha256_hex(SECRET, body.as_bytes()).expect("sign");
    let response = Client::new()
        .post(format!("{}/webhook", bridge.base))
        .header("X-Hook-Secret", signature)
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.expect("webhook json")
}

async fn wait_for_calls(mock: &Mock<'_>, expected: usize) {
    for _ in 0..150 {
        if mock.calls() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} calls, saw {}", mock.calls());
}

fn task_payload(extra: &[(&str, &str)]) -> Value {
    let mut fields = vec![
        json!({"id": "CF_TITLE", "value": "Market Outlook"}),
        json!({"id": "CF_SUMMARY", "value": "Rates are moving"}),
        json!({"id": "CF_CONTENT", "value": "<p>Body</p>"}),
        json!({"id": "CF_MEDIA", "value": "read"}),
        json!({"id": "CF_DATE", "value": "2025-06-01"}),
    ];
    fields.extend(
        extra
            .iter()
            .map(|(id, value)| json!({"id": id, "value": value})),
    );
    json!({"data": [{
        "id": "IEAT1",
        "title": "Market Outlook",
        "permalink": "https://www.wrike.com/open.htm?id=1742609723",
        "customFields": fields
    }]})
}

fn mock_comment_event<'a>(wrike: &'a MockServer, comment_id: &str, text: &str) -> Mock<'a> {
    let path = format!("/api/v4/comments/{comment_id}");
    let body = json!({"data": [{
        "id": comment_id,
        "taskId": "IEAT1",
        "authorId": "EDITOR1",
        "text": text
    }]});
    wrike.mock(|when, then| {
        when.method(GET).path(path.as_str());
        then.status(200).json_body(body);
    })
}

fn mock_task_comment<'a>(wrike: &'a MockServer, fragment: &str) -> Mock<'a> {
    let encoded = fragment.replace(' ', "+");
    wrike.mock(|when, then| {
        when.method(POST)
            .path("/api/v4/tasks/IEAT1/comments")
            .body_includes(encoded.as_str());
        then.status(200).json_body(json!({"data": [{"id": "IEAC-bot"}]}));
    })
}

fn comment_added(comment_id: &str, moment: &str) -> Value {
    json!({
        "webhookId": "WH1",
        "eventType": "CommentAdded",
        "taskId": "IEAT1",
        "commentId": comment_id,
        "lastUpdatedDate": moment
    })
}

#[tokio::test]
async fn integration_create_command_creates_article_and_writes_back_fields() {
    let wrike = MockServer::start();
    let dotcms = MockServer::start();
    mock_comment_event(&wrike, "IEAC1", "<p>Create</p>");
    let contact = wrike.mock(|when, then| {
        when.method(GET).path("/api/v4/contacts/EDITOR1");
        then.status(200)
            .json_body(json!({"data": [{"id": "EDITOR1", "firstName": "Dana", "lastName": "Reyes"}]}));
    });
    let task = wrike.mock(|when, then| {
        when.method(GET).path("/api/v4/tasks/IEAT1");
        then.status(200).json_body(task_payload(&[]));
    });
    let creating = mock_task_comment(&wrike, "Creating article");
    let created = mock_task_comment(&wrike, "Article created");
    let identifier_write = wrike.mock(|when, then| {
        when.method(PUT)
            .path("/api/v4/tasks/IEAT1")
            .json_body(json!({"customFields": [{"id": "CF_IDENTIFIER", "value": "new-id-1"}]}));
        then.status(200).json_body(json!({"data": [{"id": "IEAT1"}]}));
    });
    let flag_write = wrike.mock(|when, then| {
        when.method(PUT)
            .path("/api/v4/tasks/IEAT1")
            .json_body(json!({"customFields": [{"id": "CF_LOCKED", "value": "yes"}]}));
        then.status(200).json_body(json!({"data": [{"id": "IEAT1"}]}));
    });
    let fire = dotcms.mock(|when, then| {
        when.method(PUT)
            .path("/api/v1/workflow/actions/create-action/fire")
            .header("authorization", "Bearer dotcms-token")
            .body_includes("\"title\":\"Market Outlook\"")
            .body_includes("\"titleUrlSlug\":\"market-outlook\"")
            .body_includes("\"wrikeTicketId\":\"1742609723\"")
            .body_includes("\"dateOfPublication\":\"2025-06-01T00:00:00.000Z\"");
        then.status(200)
            .json_body(json!({"entity": {"identifier": "new-id-1", "inode": "inode-1"}}));
    });
    let bridge = start_bridge(&wrike, &dotcms).await;

    let accepted = post_signed(&bridge, json!([comment_added("IEAC1", "2025-06-01T10:00:00Z")])).await;
    assert_eq!(accepted, json!({"status": "accepted", "events": 1}));

    wait_for_calls(&created, 1).await;
    creating.assert_calls(1);
    fire.assert_calls(1);
    identifier_write.assert_calls(1);
    flag_write.assert_calls(1);
    task.assert_calls(1);
    contact.assert_calls(1);

    let again = mock_task_comment(&wrike, "Article already created on");
    post_signed(&bridge, json!([comment_added("IEAC1", "2025-06-01T10:00:00Z")])).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    again.assert_calls(0);
    fire.assert_calls(1);
}

#[tokio::test]
async fn integration_update_command_saves_once_then_reports_no_changes() {
    let wrike = MockServer::start();
    let dotcms = MockServer::start();
    mock_comment_event(&wrike, "IEAC2", "please UPDATE now");
    mock_comment_event(&wrike, "IEAC3", "update");
    wrike.mock(|when, then| {
        when.method(GET).path("/api/v4/contacts/EDITOR1");
        then.status(200)
            .json_body(json!({"data": [{"id": "EDITOR1", "name": "Dana"}]}));
    });
    wrike.mock(|when, then| {
        when.method(GET).path("/api/v4/tasks/IEAT1");
        then.status(200)
            .json_body(task_payload(&[("CF_IDENTIFIER", "abc-123"), ("CF_LOCKED", "yes")]));
    });
    let starting = mock_task_comment(&wrike, "Starting update");
    let updated = mock_task_comment(&wrike, "Article updated");
    let no_changes = mock_task_comment(&wrike, "Nothing to update");
    let current = dotcms.mock(|when, then| {
        when.method(GET).path("/api/content/id/abc-123");
        then.status(200).json_body(json!({"contentlets": [{
            "identifier": "abc-123",
            "inode": "inode-7",
            "contentType": "usInsightArticle",
            "title": "Old title",
            "metaTitle": "Kept meta"
        }]}));
    });
    let save = dotcms.mock(|when, then| {
        when.method(PUT)
            .path("/api/v1/workflow/actions/fire")
            .body_includes("\"actionName\":\"save\"")
            .body_includes("\"identifier\":\"abc-123\"")
            .body_includes("\"title\":\"Market Outlook\"")
            .body_includes("\"metaTitle\":\"Kept meta\"");
        then.status(200)
            .json_body(json!({"entity": {"identifier": "abc-123"}}));
    });
    let bridge = start_bridge(&wrike, &dotcms).await;

    post_signed(&bridge, json!([comment_added("IEAC2", "2025-06-02T09:00:00Z")])).await;
    wait_for_calls(&updated, 1).await;
    starting.assert_calls(1);
    current.assert_calls(1);
    save.assert_calls(1);

    post_signed(&bridge, json!([comment_added("IEAC3", "2025-06-02T09:05:00Z")])).await;
    wait_for_calls(&no_changes, 1).await;
    save.assert_calls(1);
    updated.assert_calls(1);

    let health: Value = Client::new()
        .get(format!("{}/healthz", bridge.base))
        .send()
        .await
        .expect("health")
        .json()
        .await
        .expect("health json");
    assert_eq!(health["events_accepted"], 2);
    assert_eq!(health["tracked_tasks"], 1);
}

#[tokio::test]
async fn regression_comments_authored_by_the_bridge_are_ignored() {
    let wrike = MockServer::start();
    let dotcms = MockServer::start();
    wrike.mock(|when, then| {
        when.method(GET).path("/api/v4/comments/IEAC9");
        then.status(200).json_body(json!({"data": [{
            "id": "IEAC9",
            "taskId": "IEAT1",
            "authorId": "BOT1",
            "text": "create"
        }]}));
    });
    let task = wrike.mock(|when, then| {
        when.method(GET).path("/api/v4/tasks/IEAT1");
        then.status(200).json_body(task_payload(&[]));
    });
    let bridge = start_bridge(&wrike, &dotcms).await;

    post_signed(&bridge, json!(comment_added("IEAC9", "2025-06-03T09:00:00Z"))).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    task.assert_calls(0);
}
