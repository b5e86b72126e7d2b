use anyhow::Result;
use toktalk_llm::{ChatClient, ChatRequest, GeminiClient, Message};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("GEMINI_API_KEY")?;
    let client = GeminiClient::new(api_key)?;

    let request = ChatRequest::new(
        "gemini-2.5-flash",
        vec![Message::human("학교 상담실은 어떤 곳인가요? 한 문장으로 알려주세요.")],
    );

    let response = client.chat(request).await?;

    println!("Response: {}", response.content.unwrap_or_default());

    if let Some(usage) = response.usage {
        println!("Tokens used: {}", usage.total_tokens);
    }

    Ok(())
}
