use futures::StreamExt;
use toktalk_llm::{ChatClient, ChatRequest, GeminiClient, Message, StreamEvent};

const MODEL: &str = "gemini-2.5-flash";

fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
    GeminiClient::new("test-key").unwrap().with_base_url(server.url())
}

#[tokio::test]
async fn test_chat_returns_first_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"[고민 분류]\n친구"}]},"finishReason":"STOP"}],
                "usageMetadata":{"promptTokenCount":12,"candidatesTokenCount":5,"totalTokenCount":17}}"#,
        )
        .create_async()
        .await;

    let response = client_for(&server)
        .chat(ChatRequest::new(MODEL, vec![Message::human("요약해 주세요")]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("[고민 분류]\n친구"));
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    assert_eq!(response.usage.unwrap().total_tokens, 17);
}

#[tokio::test]
async fn test_chat_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(429)
        .with_body("quota exceeded")
        .create_async()
        .await;

    let err = client_for(&server)
        .chat(ChatRequest::new(MODEL, vec![Message::human("hi")]))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("429"));
    assert!(message.contains("quota exceeded"));
}

#[tokio::test]
async fn test_chat_stream_yields_fragments_in_order() {
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"그랬구나\"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\", 많이 속상했겠다.\"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"\"}]},\"finishReason\":\"STOP\"}]}\r\n\r\n",
    );

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash:streamGenerateContent?alt=sse")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let stream = client_for(&server)
        .chat_stream(ChatRequest::new(
            MODEL,
            vec![Message::system("persona"), Message::human("친구와 싸웠어요")],
        ))
        .await
        .unwrap();

    let events: Vec<StreamEvent> = stream.map(|e| e.unwrap()).collect().await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Message { content: "그랬구나".to_string() },
            StreamEvent::Message { content: ", 많이 속상했겠다.".to_string() },
            StreamEvent::Done { finish_reason: Some("STOP".to_string()) },
        ]
    );
}

#[tokio::test]
async fn test_chat_stream_error_status_fails_before_streaming() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash:streamGenerateContent?alt=sse")
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let result = client_for(&server)
        .chat_stream(ChatRequest::new(MODEL, vec![Message::human("hi")]))
        .await;

    assert!(result.is_err());
}
