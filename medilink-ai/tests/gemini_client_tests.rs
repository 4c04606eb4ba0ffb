//! GeminiClient against a local one-shot HTTP responder

use medilink_ai::{
    AudioClip, GeminiClient, Transcript, TranscriptionError, TranscriptionGateway,
    DEFAULT_AUDIO_MIME,
};
use medilink_common::config::TranscriptionConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one request with `status` and `body`, returning the raw request
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (endpoint, handle)
}

fn client(endpoint: String) -> GeminiClient {
    let config = TranscriptionConfig {
        endpoint,
        model: "test-model".to_string(),
        ..TranscriptionConfig::default()
    };
    GeminiClient::new("test-key".to_string(), &config).unwrap()
}

#[tokio::test]
async fn test_transcript_returned_and_key_sent_in_header() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"candidates":[{"content":{"parts":[{"text":"I have a cough since last week."}]}}]}"#,
    )
    .await;

    let transcript = client(endpoint)
        .transcribe(&AudioClip::new(b"RIFF....WAVE".to_vec(), DEFAULT_AUDIO_MIME))
        .await
        .unwrap();
    assert_eq!(
        transcript,
        Transcript::Text("I have a cough since last week.".to_string())
    );

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1beta/models/test-model:generateContent"));
    assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
    assert!(request.contains("\"inlineData\""));
    assert!(!request.contains("key=test-key"));
}

#[tokio::test]
async fn test_no_speech_answer() {
    let (endpoint, _server) = serve_once(
        "200 OK",
        r#"{"candidates":[{"content":{"parts":[{"text":"No speech detected."}]}}]}"#,
    )
    .await;

    let transcript = client(endpoint)
        .transcribe(&AudioClip::new(vec![0; 32], DEFAULT_AUDIO_MIME))
        .await
        .unwrap();
    assert_eq!(transcript, Transcript::NoSpeech);
}

#[tokio::test]
async fn test_api_error_is_not_a_transcript() {
    let (endpoint, _server) = serve_once(
        "403 Forbidden",
        r#"{"error":{"code":403,"message":"API key not valid"}}"#,
    )
    .await;

    let result = client(endpoint)
        .transcribe(&AudioClip::new(vec![1, 2, 3], DEFAULT_AUDIO_MIME))
        .await;
    match result {
        Err(TranscriptionError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert!(message.contains("API key not valid"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_candidates_is_empty_response() {
    let (endpoint, _server) = serve_once("200 OK", r#"{"candidates":[]}"#).await;

    let result = client(endpoint)
        .transcribe(&AudioClip::new(vec![1, 2, 3], DEFAULT_AUDIO_MIME))
        .await;
    assert!(matches!(result, Err(TranscriptionError::EmptyResponse)));
}
