use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toktalk_app::{
    config::{ApiKey, Config},
    dashboard::TeacherDashboard,
    AppContext, AppError, AppState, FlowError, LaunchUrl, SystemClipboard, View,
};
use toktalk_llm::{ClientFactory, ProviderConfig};
use toktalk_persist::StoreBuilder;
use toktalk_session::{TurnEvent, TurnHandle};
use toktalk_types::CounselorType;

const BOT_LABEL: &str = "톡톡이";
const FINISH_COMMAND: &str = "/끝";

#[derive(Parser)]
#[command(name = "toktalk")]
#[command(about = "괜찮아, 톡(Talk)! Student counseling intake with an AI counselor")]
struct Cli {
    /// Address the app is opened with; a `class` query parameter starts a student-only session
    #[arg(long)]
    url: Option<String>,

    /// Directory shared by every toktalk process on this machine
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Extra configuration file layered over config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config, cli.verbose);

    tracing::info!("Starting toktalk");

    let api_key = ApiKey::from_env();
    if api_key == ApiKey::Placeholder {
        tracing::warn!("API key not set (GEMINI_API_KEY or API_KEY). Using a placeholder key; model calls will fail.");
    }
    let mut provider = ProviderConfig::gemini(api_key.as_str());
    if let Some(base_url) = &config.llm.base_url {
        provider = provider.with_base_url(base_url);
    }
    let client = ClientFactory::create_chat_client(provider)?;

    let mut store = StoreBuilder::new().poll_interval(config.storage.poll_interval());
    if let Some(dir) = cli.data_dir.as_ref().or(config.storage.data_dir.as_ref()) {
        tracing::info!(dir = %dir.display(), "using data directory");
        store = store.data_dir(dir);
    }
    let store = store.build().await?;

    let launch = LaunchUrl::parse(cli.url.as_deref().unwrap_or(&config.share.base_url))?;
    let mut ctx = AppContext::from_launch(&launch, store).await?;

    let state = AppState::new(client, config.counseling()?, Arc::new(SystemClipboard::new()));
    let mut input = Input::stdin();

    println!("괜찮아, 톡(Talk)!");
    if ctx.is_student_only() {
        while run_student(&state, &mut ctx, &mut input).await? {}
        Ok(())
    } else {
        run_teacher(&state, &mut ctx, &launch, &mut input).await
    }
}

struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        std::io::stdout().flush()?;
        self.next_line().await
    }
}

/// One student from form to confirmation; `false` once input is closed
async fn run_student(state: &AppState, ctx: &mut AppContext, input: &mut Input) -> Result<bool> {
    println!();
    println!("[{}] 어떤 고민이 있나요?", ctx.active_class().unwrap_or("-"));

    let Some(name) = input.prompt("이름: ").await? else {
        return Ok(false);
    };
    let Some(worry) = input.prompt("고민: ").await? else {
        return Ok(false);
    };
    for (index, counselor) in CounselorType::all().iter().enumerate() {
        println!("  {}. {}", index + 1, counselor);
    }
    let Some(choice) = input.prompt("누구와 이야기하고 싶나요? (1-3): ").await? else {
        return Ok(false);
    };
    let Some(counselor) = choice
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| CounselorType::all().get(i).copied())
    else {
        println!("1, 2, 3 중에서 골라주세요.");
        return Ok(true);
    };

    let mut flow = state.student_flow();
    let opening = match flow.submit(&name, &worry, counselor) {
        Ok(turn) => turn,
        Err(FlowError::Validation(e)) => {
            println!("{}", e);
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    println!("나: {}", worry);
    print_turn(opening).await;
    println!("(대화를 마치려면 {} 를 입력하세요)", FINISH_COMMAND);

    loop {
        let Some(text) = input.prompt("나: ").await? else {
            return Ok(false);
        };
        if text.trim() == FINISH_COMMAND {
            break;
        }
        if text.trim().is_empty() {
            continue;
        }
        match flow.send(&text) {
            Ok(turn) => print_turn(turn).await,
            Err(e) => println!("{}", e),
        }
    }

    println!("상담 내용을 정리하고 있어요...");
    match flow.finish(ctx).await {
        Ok(_) => {}
        Err(FlowError::NoActiveClass) => {
            println!("학급이 정해지지 않아 상담을 접수할 수 없어요.");
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    }

    println!();
    println!("고민을 이야기해줘서 고마워요!");
    println!("선생님께 잘 전달되었어요. 상담이 필요하면 언제든 찾아주세요 ^_^");
    println!("잠시 후 처음 화면으로 돌아갑니다...");
    flow.wait_for_return().await?;
    Ok(true)
}

async fn print_turn(mut turn: TurnHandle) {
    let mut started = false;
    while let Some(event) = turn.next().await {
        match event {
            TurnEvent::Placeholder => {
                print!("{}: ", BOT_LABEL);
                started = true;
            }
            TurnEvent::Fragment { content, .. } => print!("{}", content),
            TurnEvent::Complete { .. } => println!(),
            TurnEvent::Failed { apology } => {
                if started {
                    println!();
                }
                println!("{}: {}", BOT_LABEL, apology);
            }
        }
        let _ = std::io::stdout().flush();
    }
}

enum TeacherInput {
    Line(Option<String>),
    Changed(bool),
}

async fn run_teacher(
    state: &AppState,
    ctx: &mut AppContext,
    launch: &LaunchUrl,
    input: &mut Input,
) -> Result<()> {
    while ctx.active_class().is_none() {
        println!("상담을 받을 학급 이름을 정해주세요. (예: 3학년 2반)");
        let Some(name) = input.prompt("학급 이름: ").await? else {
            return Ok(());
        };
        match ctx.set_class(&name).await {
            Ok(()) => {}
            Err(AppError::Validation(e)) => println!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }

    let mut dashboard = TeacherDashboard::load(ctx, launch).await?;
    print!("\n{}", dashboard.render());
    print_teacher_help();

    let mut changes = ctx.changes();
    let mut watching = true;

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let event = tokio::select! {
            line = input.next_line() => TeacherInput::Line(line?),
            changed = changes.changed(), if watching => TeacherInput::Changed(changed.is_ok()),
        };

        let line = match event {
            TeacherInput::Changed(true) => {
                dashboard = TeacherDashboard::load(ctx, launch).await?;
                print!("\n새 소식이 있어요.\n{}", dashboard.render());
                continue;
            }
            TeacherInput::Changed(false) => {
                watching = false;
                continue;
            }
            TeacherInput::Line(None) => return Ok(()),
            TeacherInput::Line(Some(line)) => line,
        };

        let mut words = line.split_whitespace();
        match words.next() {
            Some("list") => {
                dashboard = TeacherDashboard::load(ctx, launch).await?;
                print!("{}", dashboard.render());
            }
            Some("show") => {
                let detail = words
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| dashboard.render_detail(i));
                match detail {
                    Some(text) => print!("{}", text),
                    None => println!("그런 번호의 상담은 없어요."),
                }
            }
            Some("link") => println!("{}", dashboard.student_link),
            Some("copy") => {
                if dashboard.copy_link(state.clipboard.as_ref()).await {
                    println!("학생용 접속 링크가 복사되었습니다.");
                } else {
                    println!("복사하지 못했어요. 링크: {}", dashboard.student_link);
                }
            }
            Some("student") => {
                ctx.switch_view(View::Student)?;
                let keep_going = run_student(state, ctx, input).await?;
                ctx.switch_view(View::Teacher)?;
                if !keep_going {
                    return Ok(());
                }
                dashboard = TeacherDashboard::load(ctx, launch).await?;
                print!("\n{}", dashboard.render());
            }
            Some("quit") | Some("exit") => return Ok(()),
            Some(_) => print_teacher_help(),
            None => {}
        }
    }
}

fn print_teacher_help() {
    println!("명령: list | show <번호> | link | copy | student (학생 화면 미리보기) | quit");
}

fn init_logging(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Stdout belongs to the conversation; logs go to stderr
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
