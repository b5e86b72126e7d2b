use anyhow::Result;
use futures::StreamExt;
use toktalk_llm::{ChatClient, ChatRequest, GeminiClient, Message, StreamEvent};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("GEMINI_API_KEY")?;
    let client = GeminiClient::new(api_key)?;

    let request = ChatRequest::new(
        "gemini-2.5-flash",
        vec![
            Message::system("You are a warm, concise school counselor. Answer in Korean."),
            Message::human("요즘 친구랑 사이가 안 좋아요."),
        ],
    );

    let mut stream = client.chat_stream(request).await?;

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Message { content } => {
                print!("{}", content);
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            StreamEvent::Done { finish_reason } => {
                println!("\n---");
                if let Some(reason) = finish_reason {
                    println!("Finish reason: {}", reason);
                }
            }
        }
    }

    Ok(())
}
