//!
//! eventsphere CLI binary
//! ----------------------
//! Interactive terminal front end for an EventSphere backend. Keeps the
//! signed-in session in a token file, so a later run picks up where the
//! previous one stopped.

use std::env;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use eventsphere::app::App;
use eventsphere::cli::{self, Command};
use eventsphere::config::{ClientConfig, API_URL_ENV, TOKEN_FILE_ENV};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--token-file <path>] [--login <email> <password>] [--go <path>]\n\nFlags:\n  --api <url>              Backend base URL (default: ${API_URL_ENV} or http://localhost:5000/api)\n  --token-file <path>      Where the session token is kept (default: ${TOKEN_FILE_ENV} or ~/.eventsphere/token)\n  --login <email> <pw>     Sign in before the prompt opens\n  --go <path>              Open this page before the prompt opens\n  -h, --help               Show this help\n\nLogging follows RUST_LOG (default: info).\n\n{}",
        cli::HELP
    );
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("building log filter")?;
    fmt().with_env_filter(filter).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut api: Option<String> = None;
    let mut token_file: Option<String> = None;
    let mut login: Option<(String, String)> = None;
    let mut go: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api" => {
                if i + 1 >= args.len() { eprintln!("--api requires a URL"); print_usage(&program); std::process::exit(2); }
                api = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--token-file" => {
                if i + 1 >= args.len() { eprintln!("--token-file requires a path"); print_usage(&program); std::process::exit(2); }
                token_file = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--login" => {
                if i + 2 >= args.len() { eprintln!("--login requires an email and a password"); print_usage(&program); std::process::exit(2); }
                login = Some((args[i + 1].clone(), args[i + 2].clone()));
                i += 3; continue;
            }
            "--go" => {
                if i + 1 >= args.len() { eprintln!("--go requires a path"); print_usage(&program); std::process::exit(2); }
                go = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            other => { eprintln!("unknown argument: {other}"); print_usage(&program); std::process::exit(2); }
        }
    }

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api.as_deref() { config = config.with_api_base_url(url)?; }
    if let Some(path) = token_file { config = config.with_token_path(path); }

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "eventsphere",
        "EventSphere starting: RUST_LOG='{}', api='{}', token_file='{}'",
        rust_log, config.api_base_url, config.token_path.display()
    );

    let rt = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let mut app = App::new(config)?;
    rt.block_on(app.start());

    let mut queued: Vec<Command> = Vec::new();
    if let Some((email, password)) = login { queued.push(Command::Login { email, password }); }
    queued.push(Command::Go(go.unwrap_or_else(|| app.router.location().path)));
    for cmd in queued {
        if let Err(e) = rt.block_on(cli::execute(&mut app, cmd)) { cli::print_error(&e); }
    }

    run_repl(&rt, &mut app)
}

fn run_repl(rt: &tokio::runtime::Runtime, app: &mut App) -> Result<()> {
    let mut rl = DefaultEditor::new().context("opening line editor")?;
    println!("eventsphere interpreter. Type 'help' for commands.");
    loop {
        let prompt = match app.session().user {
            Some(u) => format!("{}@{}> ", u.first_name, app.router.location().path),
            None => format!("{}> ", app.router.location().path),
        };
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() { continue; }
        let _ = rl.add_history_entry(line);
        let cmd = match cli::parse_command(line) {
            Ok(cmd) => cmd,
            Err(e) => { cli::print_error(&e); continue; }
        };
        match rt.block_on(cli::execute(app, cmd)) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => cli::print_error(&e),
        }
        cli::flush_notices(app);
    }
    Ok(())
}
