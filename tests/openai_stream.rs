// Integration tests for the chat-completions client and the streaming parse path.
use futures::StreamExt;
use http::StatusCode;
use mockito::{Matcher, Server};
use serde_json::json;
use synchrohnize::llm::{ChatModel, OpenAiClient, Prompt};
use synchrohnize::model::ScheduleEntryDraft;
use synchrohnize::parser::emit::{Framing, WriterEmitter};
use synchrohnize::service::ParseService;

const PROF_LEE: [&str; 3] = [
    r#"{"host": "Prof Lee", "day": "monday","#,
    r#" "start_time": "2:00 PM", "end_time": "3:00 PM","#,
    r#" "location": "MALA5200", "link": ""}"#,
];

fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::from(
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n",
    );
    for fragment in fragments {
        let chunk = json!({ "choices": [{ "index": 0, "delta": { "content": fragment } }] });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn client_for(server: &Server) -> OpenAiClient {
    OpenAiClient::new(&format!("{}/v1", server.url()), "sk-test", "gpt-4o", None).unwrap()
}

#[tokio::test]
async fn test_stream_yields_delta_contents_in_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({ "model": "gpt-4o", "stream": true })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&PROF_LEE))
        .create_async()
        .await;

    let client = client_for(&server);
    let fragments: Vec<String> = client
        .stream(&Prompt::new("system", "user"))
        .await
        .unwrap()
        .map(|f| f.unwrap())
        .collect()
        .await;

    assert_eq!(fragments, PROF_LEE.to_vec());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stream_parse_end_to_end() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("Prof Lee holds office hours".to_string()))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&PROF_LEE))
        .create_async()
        .await;

    let service = ParseService::new(client_for(&server));
    let mut emitter = WriterEmitter::new(Vec::new(), Framing::Lines);
    let resp = service
        .parse_stream(
            42,
            "Prof Lee holds office hours Monday 2-3pm in MALA5200",
            &mut emitter,
        )
        .await;
    assert!(resp.success, "{}", resp.message);

    let output = String::from_utf8(emitter.into_inner()).unwrap();
    let drafts: Vec<ScheduleEntryDraft> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(drafts.len(), 3);
    assert!(drafts[0].new && !drafts[0].complete);
    assert!(!drafts[1].new && !drafts[1].complete);

    let last = drafts.last().unwrap();
    assert!(last.complete);
    assert_eq!(last.course_id, 42);
    assert_eq!(last.host, "Prof Lee");
    assert_eq!(last.day, "Monday");
    assert_eq!(last.start_time, "2:00 PM");
    assert_eq!(last.end_time, "3:00 PM");
    assert_eq!(last.location, "MALA5200");
    assert_eq!(last.link, "");
    assert_eq!(last.mode, "In-person");
}

#[tokio::test]
async fn test_rejected_request_becomes_bad_request() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
        .create_async()
        .await;

    let service = ParseService::new(client_for(&server));
    let mut emitter = WriterEmitter::new(Vec::new(), Framing::Concatenated);
    let resp = service.parse_stream(1, "anything", &mut emitter).await;
    assert!(!resp.success);
    assert_eq!(resp.status_code, StatusCode::BAD_REQUEST);
    assert!(resp.message.contains("401"));
    assert!(emitter.into_inner().is_empty());
}

#[tokio::test]
async fn test_invoke_and_batch_parse() {
    let mut server = Server::new_async().await;
    let content = "```json\n[{\"host\": \"grace hopper\", \"day\": \"friday\", \"start_time\": \"10:00 am\", \"end_time\": \"11:00 am\", \"location\": \"HALL101\", \"link\": \"https://meet.example.edu/gh\"}]\n```";
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({ "stream": false })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }] })
                .to_string(),
        )
        .create_async()
        .await;

    let service = ParseService::new(client_for(&server));
    let drafts = service.parse_batch(5, "raw").await.into_data().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].host, "Grace Hopper");
    assert_eq!(drafts[0].day, "Friday");
    assert_eq!(drafts[0].start_time, "10:00 AM");
    assert_eq!(drafts[0].mode, "Hybrid");
    assert_eq!(drafts[0].course_id, 5);
}
