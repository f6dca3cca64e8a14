//! Integration tests for the krillinai-mcp tools against a mocked Krillinai.
//!
//! Run with: `cargo test --package krillinai-mcp --test integration_test`
//!
//! Every upstream call is served by a local `wiremock` server, so these tests
//! need no running Krillinai instance.

use krillinai_mcp::handler::{
    FetchFileParams, KrillinaiHandler, SUBTITLE_TASK_PATH, SetBaseUrlParams,
    SubtitleTaskDetailsParams, UPLOAD_PATH, UploadFileParams,
};
use krillinai_mcp::server::KrillinaiServer;
use krillinai_mcp::subtitle::SubtitleTaskParams;
use krillinai_mcp_common::config::Config;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An address nothing listens on.
const CLOSED_URL: &str = "http://127.0.0.1:1";

fn handler_for(base_url: &str) -> KrillinaiHandler {
    let config = Config::new(base_url).expect("test base URL should be valid");
    KrillinaiHandler::new(&config)
}

/// Handler whose API and download timeouts are overridden.
fn handler_with_timeouts(base_url: &str, api: Duration, fetch: Duration) -> KrillinaiHandler {
    let config = Config {
        api_timeout: api,
        fetch_timeout: fetch,
        ..Config::new(base_url).expect("test base URL should be valid")
    };
    KrillinaiHandler::new(&config)
}

fn task_params(args: Value) -> SubtitleTaskParams {
    serde_json::from_value(args).expect("test parameters should deserialize")
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn upload_sends_multipart_and_unwraps_file_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0,
            "msg": "ok",
            "data": {"file_path": ["local:./uploads/clip.mp4"]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("clip.mp4");
    std::fs::write(&file, b"fake video bytes").unwrap();

    let handler = handler_for(&mock_server.uri());
    let result = handler
        .upload_file(UploadFileParams {
            server_accessible_file_path: file.to_string_lossy().into_owned(),
        })
        .await;

    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
    assert_eq!(result["data"]["file_path"], "local:./uploads/clip.mp4");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"), "{}", content_type);

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"clip.mp4\""));
    assert!(body.contains("video/mp4"));
    assert!(body.contains("fake video bytes"));
}

#[tokio::test]
async fn upload_keeps_string_file_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0,
            "msg": "ok",
            "data": {"file_path": "local:./uploads/voice.wav"}
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("voice.wav");
    std::fs::write(&file, b"RIFF").unwrap();

    let result = handler_for(&mock_server.uri())
        .upload_file(UploadFileParams {
            server_accessible_file_path: file.to_string_lossy().into_owned(),
        })
        .await;

    assert_eq!(result["data"]["file_path"], "local:./uploads/voice.wav");
}

#[tokio::test]
async fn upload_missing_file_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = handler_for(&mock_server.uri())
        .upload_file(UploadFileParams {
            server_accessible_file_path: "/no/such/dir/clip.mp4".to_string(),
        })
        .await;

    assert_eq!(result["error"], 1);
    assert_eq!(result["data"], Value::Null);
    assert!(result["msg"].as_str().unwrap().contains("/no/such/dir/clip.mp4"));
}

#[tokio::test]
async fn upload_server_error_is_error_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("clip.mp4");
    std::fs::write(&file, b"x").unwrap();

    let result = handler_for(&mock_server.uri())
        .upload_file(UploadFileParams {
            server_accessible_file_path: file.to_string_lossy().into_owned(),
        })
        .await;

    assert_eq!(result["error"], 1);
    let msg = result["msg"].as_str().unwrap();
    assert!(msg.contains("500") && msg.contains("disk full"), "{}", msg);
}

// =============================================================================
// Start subtitle task
// =============================================================================

#[tokio::test]
async fn start_task_sends_minimal_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBTITLE_TASK_PATH))
        .and(body_json(json!({
            "url": "local:./uploads/clip.mp4",
            "language": "zh_cn",
            "bilingual": 2,
            "translation_subtitle_pos": 1,
            "tts": 2,
            "modal_filter": 2,
            "embed_subtitle_video_type": "none"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0,
            "msg": "ok",
            "data": {"task_id": "t-1"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = handler_for(&mock_server.uri())
        .start_subtitle_task(SubtitleTaskParams::new("local:./uploads/clip.mp4"))
        .await;

    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
    assert_eq!(result["data"]["task_id"], "t-1");
}

#[tokio::test]
async fn start_task_sends_translation_and_tts_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBTITLE_TASK_PATH))
        .and(body_json(json!({
            "url": "local:./uploads/clip.mp4",
            "language": "en",
            "origin_lang": "en",
            "target_lang": "zh_cn",
            "bilingual": 1,
            "translation_subtitle_pos": 2,
            "tts": 1,
            "tts_voice_code": 2,
            "tts_voice_clone_src_file_url": "local:./uploads/voice.wav",
            "modal_filter": 1,
            "embed_subtitle_video_type": "all",
            "vertical_major_title": "Main",
            "vertical_minor_title": "",
            "replace": ["foo|bar"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0,
            "msg": "ok",
            "data": {"task_id": "t-2"},
            "extra": "passed through"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = task_params(json!({
        "media_url_on_krillinai": "local:./uploads/clip.mp4",
        "language": "en",
        "target_lang": "zh_cn",
        "bilingual": true,
        "translation_subtitle_pos": 2,
        "tts": true,
        "tts_voice_code": 2,
        "tts_voice_clone_src_file_url": "local:./uploads/voice.wav",
        "modal_filter": true,
        "embed_subtitle_video_type": "all",
        "vertical_major_title": "Main",
        "vertical_minor_title": "",
        "replace_words": ["foo|bar"]
    }));

    let result = handler_for(&mock_server.uri())
        .start_subtitle_task(params)
        .await;

    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
    assert_eq!(result["extra"], "passed through");
}

#[tokio::test]
async fn start_task_drops_tts_fields_when_tts_off() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBTITLE_TASK_PATH))
        .and(body_json(json!({
            "url": "https://example.com/video.mp4",
            "language": "ja",
            "bilingual": 2,
            "translation_subtitle_pos": 1,
            "tts": 2,
            "modal_filter": 2,
            "embed_subtitle_video_type": "none"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0, "msg": "ok", "data": {"task_id": "t-3"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = task_params(json!({
        "media_url_on_krillinai": "https://example.com/video.mp4",
        "language": "ja",
        "target_lang": "",
        "tts": false,
        "tts_voice_code": 1,
        "tts_voice_clone_src_file_url": "local:./uploads/voice.wav",
        "replace_words": []
    }));

    let result = handler_for(&mock_server.uri())
        .start_subtitle_task(params)
        .await;

    assert_eq!(result["data"]["task_id"], "t-3");
}

#[tokio::test]
async fn start_task_upstream_rejection_is_returned_unchanged() {
    let mock_server = MockServer::start().await;

    let upstream = json!({"error": 1, "msg": "unsupported media", "data": null});
    Mock::given(method("POST"))
        .and(path(SUBTITLE_TASK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .mount(&mock_server)
        .await;

    let result = handler_for(&mock_server.uri())
        .start_subtitle_task(SubtitleTaskParams::new("local:./a.txt"))
        .await;

    assert_eq!(result, upstream);
}

#[tokio::test]
async fn start_task_unreachable_server_is_error_envelope() {
    let result = handler_for(CLOSED_URL)
        .start_subtitle_task(SubtitleTaskParams::new("local:./a.mp4"))
        .await;

    assert_eq!(result["error"], 1);
    assert_eq!(result["data"], Value::Null);
    let msg = result["msg"].as_str().unwrap();
    assert!(msg.contains("Failed to start subtitle task"), "{}", msg);
    assert!(
        msg.to_lowercase().contains("connect"),
        "connection failure cause missing: {}",
        msg
    );
}

#[tokio::test]
async fn start_task_times_out_after_api_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUBTITLE_TASK_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error": 0, "msg": "ok", "data": {"task_id": "late"}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let handler = handler_with_timeouts(
        &mock_server.uri(),
        Duration::from_millis(200),
        Duration::from_secs(60),
    );
    let started = Instant::now();
    let result = handler
        .start_subtitle_task(SubtitleTaskParams::new("local:./a.mp4"))
        .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(result["error"], 1);
    let msg = result["msg"].as_str().unwrap();
    assert!(msg.contains("timed out"), "timeout cause missing: {}", msg);
}

// =============================================================================
// Task details
// =============================================================================

#[tokio::test]
async fn task_details_rewrites_links_for_finished_task() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SUBTITLE_TASK_PATH))
        .and(query_param("taskId", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0,
            "msg": "ok",
            "data": {
                "task_id": "abc",
                "process_percent": 100,
                "subtitle_info": [
                    {"name": "origin", "download_url": "/api/file/tasks/abc/output/origin_language.srt"},
                    {"name": "target", "download_url": "api/file/tasks/abc/output/target_language.srt"}
                ],
                "speech_download_url": "/api/file/tasks/abc/output/speech.wav"
            }
        })))
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    let result = handler_for(&base)
        .get_subtitle_task_details(SubtitleTaskDetailsParams {
            task_id: "abc".to_string(),
        })
        .await;

    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
    let data = &result["data"];
    assert_eq!(
        data["subtitle_info"][0]["download_url"],
        format!("{}/api/file/tasks/abc/output/origin_language.srt", base)
    );
    assert_eq!(
        data["subtitle_info"][1]["download_url"],
        format!("{}/api/file/tasks/abc/output/target_language.srt", base)
    );
    assert_eq!(
        data["speech_download_url"],
        format!("{}/api/file/tasks/abc/output/speech.wav", base)
    );

    let links = data["potential_embedded_video_urls"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(
        links[0]["download_url"],
        format!("{}/api/file/tasks/abc/output/horizontal_embed.mp4", base)
    );
    assert_eq!(
        links[1]["download_url"],
        format!("{}/api/file/tasks/abc/output/vertical_embed.mp4", base)
    );
}

#[tokio::test]
async fn task_details_in_progress_has_no_video_links() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SUBTITLE_TASK_PATH))
        .and(query_param("taskId", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0,
            "msg": "ok",
            "data": {"process_percent": 42, "subtitle_info": [], "speech_download_url": ""}
        })))
        .mount(&mock_server)
        .await;

    let result = handler_for(&mock_server.uri())
        .get_subtitle_task_details(SubtitleTaskDetailsParams {
            task_id: "abc".to_string(),
        })
        .await;

    assert_eq!(result["data"]["speech_download_url"], "");
    assert!(result["data"].get("potential_embedded_video_urls").is_none());
}

#[tokio::test]
async fn task_details_http_error_carries_task_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SUBTITLE_TASK_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock_server)
        .await;

    let result = handler_for(&mock_server.uri())
        .get_subtitle_task_details(SubtitleTaskDetailsParams {
            task_id: "abc".to_string(),
        })
        .await;

    assert_eq!(result["error"], 1);
    assert_eq!(result["data"], json!({"task_id": "abc"}));
    let msg = result["msg"].as_str().unwrap();
    assert!(msg.contains("abc") && msg.contains("500"), "{}", msg);
}

// =============================================================================
// Fetch file as text
// =============================================================================

#[tokio::test]
async fn fetch_returns_utf8_text() {
    let mock_server = MockServer::start().await;
    let srt = "1\n00:00:00,000 --> 00:00:01,500\n你好，世界\n";

    Mock::given(method("GET"))
        .and(path("/api/file/tasks/abc/output/origin_language.srt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(srt, "application/x-subrip"))
        .mount(&mock_server)
        .await;

    let url = format!(
        "{}/api/file/tasks/abc/output/origin_language.srt",
        mock_server.uri()
    );
    let result = handler_for(CLOSED_URL)
        .fetch_file_as_text(FetchFileParams {
            full_download_url: url,
        })
        .await;

    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
    assert_eq!(result["data"]["text_content"], srt);
    assert_eq!(result["data"]["file_name"], "origin_language.srt");
    assert_eq!(result["data"]["mime_type"], "application/x-subrip");
}

#[tokio::test]
async fn fetch_falls_back_to_latin1() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/out/caf%C3%A9.srt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![b'c', b'a', b'f', 0xE9], "text/plain; charset=iso-8859-1"),
        )
        .mount(&mock_server)
        .await;

    let result = handler_for(CLOSED_URL)
        .fetch_file_as_text(FetchFileParams {
            full_download_url: format!("{}/out/caf%C3%A9.srt", mock_server.uri()),
        })
        .await;

    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
    assert_eq!(result["data"]["text_content"], "café");
    assert_eq!(result["data"]["file_name"], "café.srt");
}

#[tokio::test]
async fn fetch_not_found_is_error_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such file"))
        .mount(&mock_server)
        .await;

    let result = handler_for(CLOSED_URL)
        .fetch_file_as_text(FetchFileParams {
            full_download_url: format!("{}/missing.srt", mock_server.uri()),
        })
        .await;

    assert_eq!(result["error"], 1);
    assert_eq!(result["data"], Value::Null);
    assert!(result["msg"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn fetch_unreachable_host_is_error_envelope() {
    let result = handler_for(CLOSED_URL)
        .fetch_file_as_text(FetchFileParams {
            full_download_url: format!("{}/a.srt", CLOSED_URL),
        })
        .await;

    assert_eq!(result["error"], 1);
    let msg = result["msg"].as_str().unwrap();
    assert!(msg.contains("Failed to download file content"), "{}", msg);
    assert!(
        msg.to_lowercase().contains("connect"),
        "connection failure cause missing: {}",
        msg
    );
}

#[tokio::test]
async fn fetch_times_out_after_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow.srt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("late", "text/plain")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    // The API timeout is long, so only the download timeout can stop this.
    let handler = handler_with_timeouts(
        CLOSED_URL,
        Duration::from_secs(120),
        Duration::from_millis(200),
    );
    let started = Instant::now();
    let result = handler
        .fetch_file_as_text(FetchFileParams {
            full_download_url: format!("{}/slow.srt", mock_server.uri()),
        })
        .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(result["error"], 1);
    let msg = result["msg"].as_str().unwrap();
    assert!(msg.contains("timed out"), "timeout cause missing: {}", msg);
}

#[tokio::test]
async fn fetch_without_content_type_defaults_to_text_plain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/out/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"plain notes".to_vec()))
        .mount(&mock_server)
        .await;

    let result = handler_for(CLOSED_URL)
        .fetch_file_as_text(FetchFileParams {
            full_download_url: format!("{}/out/notes.txt", mock_server.uri()),
        })
        .await;

    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
    assert_eq!(result["data"]["text_content"], "plain notes");
    assert_eq!(result["data"]["mime_type"], "text/plain");
}

// =============================================================================
// Base URL changes
// =============================================================================

#[tokio::test]
async fn set_base_url_redirects_later_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SUBTITLE_TASK_PATH))
        .and(query_param("taskId", "t-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0, "msg": "ok", "data": {"process_percent": 10}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handler = handler_for(CLOSED_URL);
    let change = handler
        .set_base_url(SetBaseUrlParams {
            new_url: format!("{}/", mock_server.uri()),
        })
        .await;
    assert_eq!(change["error"], 0);
    assert_eq!(change["data"]["previous_base_url"], CLOSED_URL);
    assert_eq!(change["data"]["new_base_url"], mock_server.uri());

    let result = handler
        .get_subtitle_task_details(SubtitleTaskDetailsParams {
            task_id: "t-9".to_string(),
        })
        .await;
    assert_eq!(result["error"], 0, "unexpected envelope: {}", result);
}

#[tokio::test]
async fn rejected_base_url_keeps_calls_on_previous_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SUBTITLE_TASK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0, "msg": "ok", "data": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handler = handler_for(&mock_server.uri());
    let change = handler
        .set_base_url(SetBaseUrlParams {
            new_url: "krillinai.local:8888".to_string(),
        })
        .await;
    assert_eq!(change["error"], 1);

    let result = handler
        .get_subtitle_task_details(SubtitleTaskDetailsParams {
            task_id: "t".to_string(),
        })
        .await;
    assert_eq!(result["error"], 0);
}

// =============================================================================
// MCP dispatch
// =============================================================================

#[tokio::test]
async fn server_dispatch_returns_envelope_as_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SUBTITLE_TASK_PATH))
        .and(query_param("taskId", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 0, "msg": "ok", "data": {"process_percent": 100.0}
        })))
        .mount(&mock_server)
        .await;

    let server = KrillinaiServer::new(Config::new(&mock_server.uri()).unwrap());
    let args = json!({"task_id": "abc"});
    let result = server
        .dispatch(
            "get_krillinai_subtitle_task_details",
            args.as_object().cloned(),
        )
        .await
        .unwrap();

    let text = result.content[0]
        .as_text()
        .map(|t| t.text.clone())
        .unwrap_or_default();
    let envelope: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(envelope["error"], 0);
    assert_eq!(
        envelope["data"]["potential_embedded_video_urls"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );
}
