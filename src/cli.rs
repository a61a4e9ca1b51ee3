use crate::agent::ServingEndpointClient;
use crate::config::load_settings;
use crate::executor::DatabricksJobsClient;
use crate::gate::{ChatGate, GateEvent, GateState, Session};
use crate::tui::run_chat_tui;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

pub const CHAT_EXIT_COMMANDS: &[&str] = &["/exit", "exit", "quit"];
const CHAT_APPROVE_COMMANDS: &[&str] = &["/approve", "approve"];
const CHAT_CANCEL_COMMANDS: &[&str] = &["/cancel", "cancel"];

pub fn is_chat_exit_command(message: &str) -> bool {
    CHAT_EXIT_COMMANDS
        .iter()
        .any(|command| message.eq_ignore_ascii_case(command))
}

/// Maps one line of operator input to a gate event: the approval and
/// cancellation commands are recognized case-insensitively, everything
/// else is submitted as a chat message.
pub fn chat_event_for(message: &str) -> GateEvent {
    if CHAT_APPROVE_COMMANDS
        .iter()
        .any(|command| message.eq_ignore_ascii_case(command))
    {
        return GateEvent::Approve;
    }
    if CHAT_CANCEL_COMMANDS
        .iter()
        .any(|command| message.eq_ignore_ascii_case(command))
    {
        return GateEvent::Cancel;
    }
    GateEvent::Submit(message.to_string())
}

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    match args.first().map(String::as_str) {
        Some("chat") => cmd_chat(args[1..].iter().any(|arg| arg == "--plain")),
        Some("jobs") => cmd_jobs(),
        None | Some("help") | Some("--help") => Ok(help_text().to_string()),
        Some(other) => Err(format!("unknown command `{other}`; run `jobgate help`")),
    }
}

fn help_text() -> &'static str {
    "usage: jobgate <command>\n\
     \n\
     commands:\n\
     \x20 chat [--plain]  start an interactive chat session (--plain forces the line-oriented UI)\n\
     \x20 jobs            list the registered job catalog\n\
     \x20 help            show this message\n\
     \n\
     configuration is read from ~/.jobgate/settings.yaml (override with JOBGATE_SETTINGS_PATH)"
}

fn cmd_jobs() -> Result<String, String> {
    let settings = load_settings().map_err(|e| e.to_string())?;
    let catalog = settings.job_catalog().map_err(|e| e.to_string())?;
    let mut lines = vec!["registered jobs:".to_string()];
    for entry in catalog.entries() {
        lines.push(format!(
            "  {} -> job_name={} job_id={}",
            entry.label, entry.job_name, entry.job_id
        ));
    }
    Ok(lines.join("\n"))
}

fn cmd_chat(plain: bool) -> Result<String, String> {
    let settings = load_settings().map_err(|e| e.to_string())?;
    let catalog = settings.job_catalog().map_err(|e| e.to_string())?;
    let chat = ServingEndpointClient::from_settings(&settings).map_err(|e| e.to_string())?;
    let jobs = DatabricksJobsClient::from_settings(&settings).map_err(|e| e.to_string())?;
    let state_root = crate::config::default_state_root().map_err(|e| e.to_string())?;

    let gate = ChatGate::new(catalog, chat, jobs, &settings).with_session_log(state_root);
    let session = Session::new();

    if plain || !is_interactive_terminal() {
        run_plain_chat(&gate, session)
    } else {
        run_chat_tui(Arc::new(gate), session)?;
        Ok("chat ended".to_string())
    }
}

fn is_interactive_terminal() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

fn run_plain_chat<C, J>(gate: &ChatGate<C, J>, mut session: Session) -> Result<String, String>
where
    C: crate::agent::ChatBackend,
    J: crate::executor::JobsBackend,
{
    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout()
            .flush()
            .map_err(|e| format!("failed to flush stdout: {e}"))?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        if read == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if is_chat_exit_command(message) {
            break;
        }

        for rendered in gate.dispatch(&mut session, chat_event_for(message)) {
            println!("{}> {}", rendered.speaker, rendered.text);
        }
        if session.state() == GateState::Pending {
            println!("system> plan awaiting approval: type /approve to execute or /cancel to discard");
        }
    }
    Ok("chat ended".to_string())
}
