#![deny(missing_docs)]

//! Command-line entry point invoked by the host IDE's commands.

use std::io;
use std::path::PathBuf;

use buildstamp::env_probe::EnvSnapshot;
use buildstamp::logging;
use buildstamp::record::{self, RecordContext, RecordOutcome, TerminalPrompter};
use buildstamp::settings::{self, ToolSettings};
use time::OffsetDateTime;

fn main() {
    // The local offset is only readable while the process is single-threaded.
    let now = now_local_or_utc();
    if let Err(err) = logging::init(now) {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run(now) {
        tracing::error!("Command failed: {err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(now: OffsetDateTime) -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let project_dir = match options.project_dir {
        Some(dir) => Some(dir),
        None => std::env::current_dir().ok(),
    };

    match options.command {
        Command::Record => {
            let mut env = EnvSnapshot::capture();
            if let Some(version) = options.ide_version {
                env = env.with_ide_version(version);
            }
            let ctx = RecordContext::new(project_dir, env, load_settings(), now);
            let stdin = io::stdin();
            let mut prompts = TerminalPrompter::new(stdin.lock(), io::stdout());
            match record::record_build(&ctx, &mut prompts).map_err(|err| err.to_string())? {
                RecordOutcome::Recorded(summary) => println!("{summary}"),
                RecordOutcome::Aborted => println!("Cancelled; nothing recorded."),
            }
        }
        Command::History => {
            let path =
                record::view_history(project_dir.as_deref()).map_err(|err| err.to_string())?;
            if options.print {
                let text = std::fs::read_to_string(&path)
                    .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
                print!("{text}");
            } else {
                open::that(&path)
                    .map_err(|err| format!("Failed to open {}: {err}", path.display()))?;
            }
        }
        Command::Probe => {
            let mut env = EnvSnapshot::capture();
            if let Some(version) = options.ide_version {
                env = env.with_ide_version(version);
            }
            let ctx = RecordContext::new(project_dir, env, load_settings(), now);
            let tools = record::probe_environment(&ctx);
            println!("IDE: {}", tools.ide);
            println!("DevTools: {}", tools.dev_tool);
        }
    }
    Ok(())
}

fn load_settings() -> ToolSettings {
    settings::load_or_default().unwrap_or_else(|err| {
        tracing::warn!("Using default settings: {err}");
        ToolSettings::default()
    })
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Record,
    History,
    Probe,
}

#[derive(Debug)]
struct Options {
    command: Command,
    project_dir: Option<PathBuf>,
    ide_version: Option<String>,
    print: bool,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut command = None;
    let mut project_dir = None;
    let mut ide_version = None;
    let mut print = false;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--project" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--project requires a value".to_string())?;
                project_dir = Some(PathBuf::from(value));
            }
            "--ide-version" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--ide-version requires a value".to_string())?;
                ide_version = Some(value.to_string());
            }
            "--print" => {
                print = true;
            }
            "record" if command.is_none() => command = Some(Command::Record),
            "history" if command.is_none() => command = Some(Command::History),
            "probe" if command.is_none() => command = Some(Command::Probe),
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    let Some(command) = command else {
        return Err(format!("Missing command\n\n{}", help_text()));
    };
    if print && command != Command::History {
        return Err("--print only applies to the history command".to_string());
    }
    Ok(Some(Options {
        command,
        project_dir,
        ide_version,
        print,
    }))
}

fn help_text() -> &'static str {
    "buildstamp <command> [options]

Commands:
  record      Bump the manifest version and record the build
  history     Open BUILD_HISTORY.md (use --print to write it to stdout)
  probe       Show the detected IDE and DevTools versions

Options:
  --project <dir>       Project directory (default: current directory)
  --ide-version <v>     IDE version reported by the host
  --print               Print the history instead of opening it
  -h, --help            Show this help

Prompts: press Enter to accept the default, q or end of input to cancel."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn parses_record_with_options() {
        let options = parse_args(args(&["record", "--project", "app", "--ide-version", "4.29"]))
            .unwrap()
            .unwrap();
        assert_eq!(options.command, Command::Record);
        assert_eq!(options.project_dir, Some(PathBuf::from("app")));
        assert_eq!(options.ide_version.as_deref(), Some("4.29"));
        assert!(!options.print);
    }

    #[test]
    fn history_accepts_print() {
        let options = parse_args(args(&["history", "--print"])).unwrap().unwrap();
        assert_eq!(options.command, Command::History);
        assert!(options.print);
    }

    #[test]
    fn rejects_missing_or_duplicate_commands() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["record", "history"])).is_err());
        assert!(parse_args(args(&["record", "--print"])).is_err());
        assert!(parse_args(args(&["--project"])).is_err());
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse_args(args(&["--help", "bogus"])).unwrap().is_none());
    }
}
