use anyhow::Result;
use std::io::{self, Write};
use std::sync::Arc;
use toktalk_llm::GeminiClient;
use toktalk_session::{ConversationSession, CounselingConfig, Summarizer, Transcript, TurnEvent};

#[tokio::main]
async fn main() -> Result<()> {
    println!("톡톡이와 대화하기 (빈 줄을 입력하면 상담을 마치고 요약합니다)");

    let api_key = std::env::var("GEMINI_API_KEY")?;
    let client = Arc::new(GeminiClient::new(api_key)?);
    let config = CounselingConfig::default();
    let session = ConversationSession::open(client.clone(), &config);

    let mut first_message = None;
    loop {
        print!("\n\x1b[1;36m 학생: \x1b[0m");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();
        if input.is_empty() {
            break;
        }
        first_message.get_or_insert_with(|| input.to_string());

        let mut turn = session.send(input)?;
        while let Some(event) = turn.next().await {
            match event {
                TurnEvent::Placeholder => print!("\x1b[1;32m 톡톡이: \x1b[0m"),
                TurnEvent::Fragment { content, .. } => print!("{}", content),
                TurnEvent::Complete { .. } => println!(),
                TurnEvent::Failed { apology } => println!("\n 톡톡이: {}", apology),
            }
            io::stdout().flush()?;
        }
    }

    let Some(worry) = first_message else {
        return Ok(());
    };
    let summarizer = Summarizer::new(client, &config);
    let transcript: Transcript = session.transcript().without_blank().into();
    let summary = summarizer.summarize("학생", &worry, &transcript).await;

    println!("\n--- 교사용 요약 ---\n{}", summary.text());
    Ok(())
}
