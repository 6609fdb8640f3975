//! Terminal front end: command parsing and the interactive session.

pub mod outputformatter;

pub use outputformatter::{print_page_content, print_table};

use std::future::Future;

use serde::Serialize;
use serde_json::json;

use crate::api::models::{ChangePasswordRequest, Credentials, ExpoDraft, FeedbackDraft, ProfileUpdate};
use crate::app::{App, Opened};
use crate::boundary::{Recovery, Rendered};
use crate::error::{AppError, AppResult};
use crate::identity::Role;
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::pages::PageContent;
use crate::routing::View;
use crate::validation::{self, RegisterForm};

pub const HELP: &str = "\
Commands:
  login <email> <password>                         sign in
  register <first> <last> <email> <password> <role> [company]
                                                   create an account (accepts the terms)
  logout                                           sign out
  whoami                                           show the signed-in user
  menu                                             show the dashboard menu for your role
  go <path>                                        open a page, e.g. go /dashboard/users
  back                                             return to the previous page
  forgot <email>                                   send a password reset email
  reset-password <token> <password>                set a new password from a reset email
  passwd <current> <new>                           change your password
  profile <first|last|phone|company> <value>       update your profile
  create-expo <start> <end> <title...>             create an expo (dates YYYY-MM-DD, '-' to skip)
  edit-expo <id> <start> <end> <title...>          update an expo
  approve <id> | reject <id>                       decide an exhibitor application
  register-expo <id>                               register to attend an expo
  book <id> | cancel <id>                          book or cancel a schedule session
  feedback <subject> <message...>                  open a support ticket
  status                                           show session and location
  reset                                            clear a crashed page and retry
  reload                                           rebuild state from the stored token
  help                                             show this help
  quit | exit                                      leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Register { form: RegisterForm },
    Logout,
    Whoami,
    Menu,
    Go(String),
    Back,
    Forgot(String),
    ResetPassword { token: String, password: String },
    Passwd { current: String, new: String },
    Profile { patch: ProfileUpdate },
    CreateExpo { draft: ExpoDraft },
    EditExpo { id: String, draft: ExpoDraft },
    Approve(String),
    Reject(String),
    RegisterExpo(String),
    Book(String),
    Cancel(String),
    Feedback { draft: FeedbackDraft },
    Status,
    Reset,
    Reload,
    Help,
    Quit,
}

fn usage(text: &str) -> AppError { AppError::field("command", format!("usage: {text}")) }

/// `-` leaves a date out.
fn expo_draft(start: &str, end: &str, title: &[&str]) -> ExpoDraft {
    let date = |d: &str| (d != "-").then(|| d.to_string());
    ExpoDraft { title: title.join(" "), start_date: date(start), end_date: date(end), ..Default::default() }
}

fn profile_patch(field: &str, value: String) -> AppResult<ProfileUpdate> {
    let mut patch = ProfileUpdate::default();
    match field.to_ascii_lowercase().as_str() {
        "first" | "first-name" => patch.first_name = Some(value),
        "last" | "last-name" => patch.last_name = Some(value),
        "phone" => patch.phone = Some(value),
        "company" => patch.company = Some(value),
        other => return Err(AppError::field("profile", format!("unknown profile field '{other}'"))),
    }
    Ok(patch)
}

pub fn parse_command(line: &str) -> AppResult<Command> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((head, rest)) = parts.split_first() else {
        return Err(usage("help"));
    };
    let cmd = match (head.to_ascii_lowercase().as_str(), rest) {
        ("login", [email, password]) => Command::Login { email: email.to_string(), password: password.to_string() },
        ("login", _) => return Err(usage("login <email> <password>")),
        ("register", [first, last, email, password, role, company @ ..]) if company.len() <= 1 => {
            let role: Role = role.parse()?;
            Command::Register {
                form: RegisterForm {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    confirm_password: password.to_string(),
                    role: Some(role),
                    phone: String::new(),
                    company: company.first().map(|c| c.to_string()).unwrap_or_default(),
                    agree_to_terms: true,
                },
            }
        }
        ("register", _) => return Err(usage("register <first> <last> <email> <password> <role> [company]")),
        ("logout", []) => Command::Logout,
        ("whoami", []) => Command::Whoami,
        ("menu", []) => Command::Menu,
        ("go", [path]) => Command::Go(path.to_string()),
        ("go", _) => return Err(usage("go <path>")),
        ("back", []) => Command::Back,
        ("forgot", [email]) => Command::Forgot(email.to_string()),
        ("forgot", _) => return Err(usage("forgot <email>")),
        ("reset-password", [token, password]) => {
            Command::ResetPassword { token: token.to_string(), password: password.to_string() }
        }
        ("reset-password", _) => return Err(usage("reset-password <token> <password>")),
        ("passwd", [current, new]) => Command::Passwd { current: current.to_string(), new: new.to_string() },
        ("passwd", _) => return Err(usage("passwd <current> <new>")),
        ("profile", [field, value @ ..]) if !value.is_empty() => {
            Command::Profile { patch: profile_patch(field, value.join(" "))? }
        }
        ("profile", _) => return Err(usage("profile <first|last|phone|company> <value>")),
        ("create-expo", [start, end, title @ ..]) => Command::CreateExpo { draft: expo_draft(start, end, title) },
        ("create-expo", _) => return Err(usage("create-expo <start> <end> <title...>")),
        ("edit-expo", [id, start, end, title @ ..]) => {
            Command::EditExpo { id: id.to_string(), draft: expo_draft(start, end, title) }
        }
        ("edit-expo", _) => return Err(usage("edit-expo <id> <start> <end> <title...>")),
        ("approve", [id]) => Command::Approve(id.to_string()),
        ("approve", _) => return Err(usage("approve <application id>")),
        ("reject", [id]) => Command::Reject(id.to_string()),
        ("reject", _) => return Err(usage("reject <application id>")),
        ("register-expo", [id]) => Command::RegisterExpo(id.to_string()),
        ("register-expo", _) => return Err(usage("register-expo <expo id>")),
        ("book", [id]) => Command::Book(id.to_string()),
        ("book", _) => return Err(usage("book <session id>")),
        ("cancel", [id]) => Command::Cancel(id.to_string()),
        ("cancel", _) => return Err(usage("cancel <session id>")),
        ("feedback", [subject, message @ ..]) => Command::Feedback {
            draft: FeedbackDraft { subject: subject.to_string(), message: message.join(" "), category: None },
        },
        ("feedback", _) => return Err(usage("feedback <subject> <message...>")),
        ("status", []) => Command::Status,
        ("reset", []) => Command::Reset,
        ("reload", []) => Command::Reload,
        ("help", _) | ("?", _) => Command::Help,
        ("quit", _) | ("exit", _) => Command::Quit,
        (other, _) => return Err(AppError::field("command", format!("unknown command '{other}'; type 'help'"))),
    };
    Ok(cmd)
}

pub fn print_error(e: &AppError) {
    match e.field_errors() {
        Some(fields) if fields.len() > 1 => {
            for (field, msg) in fields {
                eprintln!("  {field}: {msg}");
            }
        }
        _ => eprintln!("error: {}", e.message()),
    }
}

/// Print and clear the pending notifications.
pub fn flush_notices(app: &App) {
    for n in app.notices.drain() {
        match n.level {
            NoticeLevel::Success => println!("[ok] {}", n.message),
            NoticeLevel::Error => println!("[!!] {}", n.message),
        }
    }
}

pub fn print_opened(app: &App, opened: &Opened) {
    let loc = &opened.screen.location;
    match &opened.screen.view {
        View::Page(page) => {
            if loc.path.starts_with(crate::routing::DASHBOARD_PATH) {
                let shell = app.shell();
                let active = shell.active().map(|i| i.label).unwrap_or("-");
                println!("== {} ({}) | {} [{}] | {}", page.title(), loc.path, shell.full_name, shell.role_label, active);
            } else {
                println!("== {} ({})", page.title(), loc.path);
            }
            if let Some(from) = &loc.from {
                println!("   sign in to continue to {from}");
            }
        }
        View::Denied(denied) => {
            println!("== Access Denied! ({})", loc.path);
            println!("   {denied}");
            println!("   type 'back' to go back");
        }
    }
    match &opened.content {
        Some(Rendered::Ok(content)) => print_page_content(content),
        Some(Rendered::Failed(e)) => print_error(e),
        Some(Rendered::Crashed(panel)) => {
            println!("!! {}", panel.title);
            println!("   {}", panel.detail);
            println!("   type 'reset' to try again or 'reload' to reload");
        }
        None => {}
    }
}

fn print_menu(app: &App) {
    let shell = app.shell();
    if !shell.full_name.is_empty() {
        println!("{} ({}) {} [{}]", shell.full_name, shell.initials, shell.email, shell.role_label);
    }
    for e in &shell.entries {
        let marker = if e.active { ">" } else { " " };
        println!("{marker} {:<22} {}", e.item.label, e.item.href);
    }
}

/// Send one resource action, announce it and print the record that came back.
async fn act<T, F>(app: &App, action: F, done: &str, failed: &str) -> AppResult<()>
where
    T: Serialize,
    F: Future<Output = AppResult<T>>,
{
    match action.await {
        Ok(record) => {
            app.notices.notify(Notice::success(done));
            flush_notices(app);
            print_page_content(&PageContent::Record(serde_json::to_value(record)?));
            Ok(())
        }
        Err(e) => Err(e.into_user_facing(failed)),
    }
}

/// Run one command. Returns `false` when the session should end.
pub async fn execute(app: &mut App, cmd: Command) -> AppResult<bool> {
    match cmd {
        Command::Login { email, password } => {
            let creds = Credentials { email, password };
            validation::validate_login(&creds)?;
            let result = app.auth.login(&creds).await;
            flush_notices(app);
            result?;
            let target = app.router.post_login_target();
            let opened = app.open(&target).await;
            print_opened(app, &opened);
        }
        Command::Register { form } => {
            validation::validate_registration(&form)?;
            let result = app.auth.register(&form).await;
            flush_notices(app);
            result?;
            let opened = app.open(crate::routing::DASHBOARD_PATH).await;
            print_opened(app, &opened);
        }
        Command::Logout => {
            app.auth.logout().await;
            flush_notices(app);
            let opened = app.open(crate::routing::ROOT_PATH).await;
            print_opened(app, &opened);
        }
        Command::Whoami => match app.session().user {
            Some(u) => println!("{} <{}> role={} id={}", u.full_name(), u.email, u.role, u.id),
            None => println!("not signed in"),
        },
        Command::Menu => print_menu(app),
        Command::Go(path) => {
            let opened = app.open(&path).await;
            flush_notices(app);
            print_opened(app, &opened);
        }
        Command::Back => match app.back().await {
            Some(opened) => print_opened(app, &opened),
            None => println!("no previous page"),
        },
        Command::Forgot(email) => {
            validation::validate_forgot_password(&email)?;
            let result = app.auth.forgot_password(&email).await;
            flush_notices(app);
            result?;
        }
        Command::ResetPassword { token, password } => {
            validation::validate_password_reset(&password, &password)?;
            let result = app.auth.reset_password(&token, &password).await;
            flush_notices(app);
            result?;
            let opened = app.open(crate::routing::DASHBOARD_PATH).await;
            print_opened(app, &opened);
        }
        Command::Passwd { current, new } => {
            validation::validate_password_reset(&new, &new)?;
            let req = ChangePasswordRequest { current_password: current, new_password: new };
            let result = app.auth.change_password(&req).await;
            flush_notices(app);
            result?;
        }
        Command::Profile { patch } => {
            validation::validate_profile(&patch)?;
            let result = app.auth.update_profile(&patch).await;
            flush_notices(app);
            let user = result?;
            println!("{} <{}> role={}", user.full_name(), user.email, user.role);
        }
        Command::CreateExpo { draft } => {
            validation::validate_expo(&draft)?;
            act(app, app.api.expos.create(&draft), "Expo created successfully!", "Failed to create expo").await?;
        }
        Command::EditExpo { id, draft } => {
            validation::validate_expo(&draft)?;
            act(app, app.api.expos.update(&id, &draft), "Expo updated successfully!", "Failed to update expo").await?;
        }
        Command::Approve(id) => {
            act(app, app.api.exhibitors.approve(&id), "Application approved", "Failed to approve application").await?;
        }
        Command::Reject(id) => {
            act(app, app.api.exhibitors.reject(&id), "Application rejected", "Failed to reject application").await?;
        }
        Command::RegisterExpo(id) => {
            let body = json!({});
            act(app, app.api.attendees.register(&id, &body), "Registered for expo!", "Failed to register for expo").await?;
        }
        Command::Book(id) => {
            act(app, app.api.schedule.book(&id), "Session booked!", "Failed to book session").await?;
        }
        Command::Cancel(id) => {
            act(app, app.api.schedule.cancel_booking(&id), "Booking cancelled", "Failed to cancel booking").await?;
        }
        Command::Feedback { draft } => {
            validation::validate_feedback(&draft)?;
            act(app, app.api.feedback.create(&draft), "Feedback submitted!", "Failed to submit feedback").await?;
        }
        Command::Status => {
            let s = app.session();
            let loc = app.router.location();
            println!(
                "state={} authenticated={} loading={} path={}",
                app.store.state().name(),
                s.is_authenticated,
                s.is_loading,
                loc.path
            );
            if let Some(err) = &s.error {
                println!("last error: {err}");
            }
            println!("api={} token_file={}", app.config.api_base_url, app.config.token_path.display());
        }
        Command::Reset => {
            let opened = app.recover(Recovery::Reset).await?;
            print_opened(app, &opened);
        }
        Command::Reload => {
            let opened = app.recover(Recovery::Reload).await?;
            flush_notices(app);
            print_opened(app, &opened);
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login_and_navigation() {
        assert_eq!(
            parse_command("login a@b.com secret").unwrap(),
            Command::Login { email: "a@b.com".into(), password: "secret".into() }
        );
        assert_eq!(parse_command("GO /dashboard/users").unwrap(), Command::Go("/dashboard/users".into()));
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn register_builds_a_complete_form() {
        let Command::Register { form } = parse_command("register Ana Diaz ana@x.io Secret123 exhibitor Acme").unwrap()
        else {
            panic!("expected register");
        };
        assert_eq!(form.role, Some(Role::Exhibitor));
        assert_eq!(form.company, "Acme");
        assert_eq!(form.confirm_password, form.password);
        assert!(form.agree_to_terms);
        assert!(validation::validate_registration(&form).is_ok());
    }

    #[test]
    fn bad_input_reports_usage() {
        assert!(parse_command("login only-email").unwrap_err().message().starts_with("usage:"));
        assert!(parse_command("register a b c d wizard").is_err());
        assert!(parse_command("dance").unwrap_err().message().contains("unknown command"));
        assert!(parse_command("   ").is_err());
    }

    #[test]
    fn resource_actions_parse_with_their_arguments() {
        let Command::CreateExpo { draft } = parse_command("create-expo 2025-10-01 - Spring Build Week").unwrap() else {
            panic!("expected create-expo");
        };
        assert_eq!(draft.title, "Spring Build Week");
        assert_eq!(draft.start_date.as_deref(), Some("2025-10-01"));
        assert_eq!(draft.end_date, None);

        assert_eq!(parse_command("approve app-7").unwrap(), Command::Approve("app-7".into()));
        assert_eq!(parse_command("cancel s1").unwrap(), Command::Cancel("s1".into()));
        assert_eq!(parse_command("register-expo e1").unwrap(), Command::RegisterExpo("e1".into()));

        let Command::Feedback { draft } = parse_command("feedback Wifi hall B has no signal").unwrap() else {
            panic!("expected feedback");
        };
        assert_eq!(draft.message, "hall B has no signal");

        let Command::Profile { patch } = parse_command("profile company Acme Events").unwrap() else {
            panic!("expected profile");
        };
        assert_eq!(patch, ProfileUpdate { company: Some("Acme Events".into()), ..Default::default() });
    }

    #[test]
    fn resource_actions_reject_bad_shapes() {
        assert!(parse_command("approve").unwrap_err().message().starts_with("usage:"));
        assert!(parse_command("book a b").unwrap_err().message().starts_with("usage:"));
        assert!(parse_command("profile company").unwrap_err().message().starts_with("usage:"));
        assert!(parse_command("profile shoe 42").unwrap_err().message().contains("unknown profile field"));
        // Parsed, but the form check stops it before any request.
        let Command::CreateExpo { draft } = parse_command("create-expo 2025-10-02 2025-10-01").unwrap() else {
            panic!("expected create-expo");
        };
        let err = validation::validate_expo(&draft).unwrap_err();
        assert!(err.field_errors().is_some_and(|f| f.contains_key("title") && f.contains_key("endDate")));
    }
}
