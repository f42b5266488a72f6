//! classroom-qa: command-line front end for the classroom Q&A service.
//! Reads config, talks to the REST API, and follows a session live over the
//! realtime channel.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use classroom_qa_client::config::{self, Config};
use classroom_qa_client::{
    channel, FileSessionStore, HttpApi, InstructorDashboard, QaApi, QuestionId, Session,
    SessionId, StudentCommand, StudentDashboard, StudentDriver, StudentView, UserId,
};

#[derive(Parser)]
#[command(name = "classroom-qa", about = "Classroom Q&A client")]
struct Cli {
    /// Config file (default: ~/.classroom-qa/config.yaml)
    #[arg(long, env = "CLASSROOM_QA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Identity to act as (overrides api.user_id)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List your active sessions
    Sessions,
    /// Create a session
    Create {
        #[arg(long)]
        course: String,
        #[arg(long)]
        description: Option<String>,
        /// Session date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// End a session (irreversible)
    End {
        session: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List the questions of a session
    Questions { session: String },
    /// Mark a question answered
    Answer { question: String },
    /// Join a session and ask a question (read from stdin when omitted)
    Ask {
        session: String,
        text: Vec<String>,
    },
    /// Join a session and follow it live; each stdin line is asked as a question
    Watch { session: String },
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(config::default_config_path).unwrap_or_else(|| {
        eprintln!("Error: unable to determine config path (set --config or CLASSROOM_QA_CONFIG)");
        process::exit(1);
    })
}

fn fail(context: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}: {}", context, message);
    process::exit(1);
}

fn print_session(out: &mut impl Write, s: &Session) {
    let _ = writeln!(
        out,
        "{}  {}  {}  {} questions{}",
        s.session_id,
        s.course_name,
        s.session_date,
        s.question_count,
        if s.is_active { "" } else { "  (ended)" }
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("classroom_qa_client=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);
    let cfg = match config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => fail(&format!("failed to load config from {}", config_path.display()), e),
    };
    let user = cli.user.or_else(|| cfg.api.user_id.clone()).map(UserId::new);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail("failed to create runtime", e));

    rt.block_on(run(cli.command, cfg, user));
}

async fn run(command: Command, cfg: Config, user: Option<UserId>) {
    let api: Arc<dyn QaApi> = Arc::new(HttpApi::new(cfg.api_url(), cfg.api.auth_token.clone()));
    let stdout = io::stdout();

    match command {
        Command::Sessions => {
            let mut dashboard = InstructorDashboard::new(api, cfg.session_list_limit());
            if let Err(e) = dashboard.load().await {
                fail("failed to load sessions", e.user_message());
            }
            let mut out = stdout.lock();
            if dashboard.selection().sessions().is_empty() {
                let _ = writeln!(out, "No active sessions");
            }
            for s in dashboard.selection().sessions() {
                print_session(&mut out, s);
            }
        }
        Command::Create {
            course,
            description,
            date,
        } => {
            let mut dashboard = InstructorDashboard::new(api, cfg.session_list_limit());
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            if let Err(e) = dashboard.create(&course, description.as_deref(), date).await {
                fail("failed to create session", e.user_message());
            }
            if let Some(s) = dashboard.selection().selected_session() {
                print_session(&mut stdout.lock(), s);
            }
        }
        Command::End { session, yes } => {
            let mut dashboard = InstructorDashboard::new(api, cfg.session_list_limit());
            let id = SessionId::new(session.trim().to_uppercase());
            if !yes && !confirm(&id) {
                eprintln!("Cancelled");
                process::exit(1);
            }
            dashboard.request_end(&id);
            if let Err(e) = dashboard.confirm_end().await {
                eprintln!("Error: {}", dashboard.error().unwrap_or(&e.user_message()));
                process::exit(1);
            }
            let _ = writeln!(stdout.lock(), "Session {} ended", id);
        }
        Command::Questions { session } => {
            let id = SessionId::new(session.trim().to_uppercase());
            match api.get_questions(&id, cfg.question_page()).await {
                Ok(questions) => {
                    let mut out = stdout.lock();
                    for q in questions {
                        let _ = writeln!(out, "{}  [{:?}]  {}", q.id, q.status, q.text);
                    }
                }
                Err(e) => fail("failed to load questions", e.user_message()),
            }
        }
        Command::Answer { question } => {
            let dashboard = InstructorDashboard::new(api, cfg.session_list_limit());
            if let Err(e) = dashboard.answer_question(&QuestionId::new(question)).await {
                fail("failed to answer question", e.user_message());
            }
        }
        Command::Ask { session, text } => {
            let text = if text.is_empty() {
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line).unwrap_or(0);
                line.trim().to_string()
            } else {
                text.join(" ")
            };
            let mut dashboard = student(api, &cfg, user);
            if let Err(e) = dashboard.load_session(&session).await {
                fail("failed to join session", e.user_message());
            }
            if let Err(e) = dashboard.submit_question(&text).await {
                fail("failed to submit question", e.user_message());
            }
            let _ = writeln!(stdout.lock(), "Question submitted to {}", session.trim().to_uppercase());
        }
        Command::Watch { session } => watch(api, cfg, user, session).await,
    }
}

fn confirm(id: &SessionId) -> bool {
    eprintln!("End session {}? Students will no longer be able to submit questions.", id);
    eprint!("This cannot be undone. Type 'yes' to continue: ");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap_or(0);
    line.trim().eq_ignore_ascii_case("yes")
}

fn student(api: Arc<dyn QaApi>, cfg: &Config, user: Option<UserId>) -> StudentDashboard {
    let Some(user) = user else {
        fail("no identity", "set api.user_id in the config or pass --user");
    };
    let Some(state_dir) = cfg.state_dir() else {
        fail("no state directory", "set storage.state_dir in the config");
    };
    let store = Arc::new(FileSessionStore::new(state_dir));
    let mut dashboard = StudentDashboard::new(api, store, cfg.echo_timeout());
    // one-shot commands do not keep a channel, so restore effects are dropped
    let _ = dashboard.login(user);
    dashboard
}

async fn watch(api: Arc<dyn QaApi>, cfg: Config, user: Option<UserId>, session: String) {
    let dashboard = student(api.clone(), &cfg, user);
    let (handle, events, _channel_task) = channel::spawn(cfg.realtime_url(), cfg.reconnect_delay());
    let (driver, mut view) = StudentDriver::new(dashboard, api, handle, cfg.question_page());
    let (commands, command_rx) = mpsc::channel(16);
    let driver_task = tokio::spawn(driver.run(events, command_rx));

    let _ = commands.send(StudentCommand::Load(session)).await;

    let input = commands.clone();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "" => continue,
                "/leave" => StudentCommand::Leave,
                "/refresh" => StudentCommand::Refresh,
                text => StudentCommand::Ask(text.to_string()),
            };
            if input.blocking_send(command).is_err() {
                break;
            }
        }
    });
    drop(commands);

    while view.changed().await.is_ok() {
        let snapshot = view.borrow_and_update().clone();
        render(&snapshot);
        if snapshot.notice.is_some() && snapshot.session.is_none() {
            break;
        }
    }
    driver_task.abort();
}

fn render(view: &StudentView) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = writeln!(out, "----");
    let _ = writeln!(
        out,
        "{}",
        if view.connected { "Connected" } else { "Disconnected" }
    );
    if let Some(s) = &view.session {
        print_session(&mut out, s);
    }
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "{}", notice);
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {}", error);
    }
    let _ = writeln!(out, "Asked ({}):", view.asked.len());
    for q in &view.asked {
        let _ = writeln!(out, "  {}", q.text);
    }
    let _ = writeln!(out, "Answered ({}):", view.answered.len());
    for q in &view.answered {
        let _ = writeln!(out, "  {}", q.text);
    }
    let _ = out.flush();
}
