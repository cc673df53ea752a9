//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive `todolist_core` end to end from argv: one intent per run.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use std::time::Duration;
use todolist_core::{
    core_version, CoreConfig, Intent, TaskFilter, TaskId, TaskListController, TaskRuntime,
};

const STORE_WAIT: Duration = Duration::from_secs(5);
const USAGE: &str = "usage: todolist_cli <list [all|done|active] | add <title> | rename <id> <title> | done <id> | delete <id> | version>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Show(TaskFilter),
    Apply(Intent),
    Version,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let command = parse_command(args)?;
    if command == Command::Version {
        println!("todolist_core version={}", core_version());
        return Ok(());
    }

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    let runtime = TaskRuntime::start(&config).map_err(|err| err.to_string())?;
    let mut controller = runtime.controller().map_err(|err| err.to_string())?;
    controller.wait_for_update(STORE_WAIT);

    let filter = match command {
        Command::Show(filter) => filter,
        Command::Apply(intent) => {
            controller.dispatch(intent).map_err(|err| {
                err.user_message().unwrap_or_else(|| err.to_string())
            })?;
            controller.wait_until(STORE_WAIT, TaskListController::is_idle);
            if let Some(err) = controller.last_error() {
                log::warn!("event=cli_apply module=cli status=error error={err}");
                eprintln!("{}", err.user_message().unwrap_or_else(|| err.to_string()));
            }
            controller.filter()
        }
        Command::Version => TaskFilter::ShowAll,
    };

    controller.set_filter(filter);
    print_tasks(&controller);
    runtime.shutdown();
    Ok(())
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let (name, rest) = args.split_first().ok_or_else(|| USAGE.to_string())?;
    match (name.as_str(), rest) {
        ("list", []) => Ok(Command::Show(TaskFilter::ShowAll)),
        ("list", [filter]) => filter
            .parse()
            .map(Command::Show)
            .map_err(|err: todolist_core::ParseTaskFilterError| err.to_string()),
        ("add", words) if !words.is_empty() => Ok(Command::Apply(Intent::AddTask {
            title: words.join(" "),
        })),
        ("rename", [id, words @ ..]) if !words.is_empty() => Ok(Command::Apply(Intent::UpdateTask {
            id: parse_id(id)?,
            title: words.join(" "),
        })),
        ("done", [id]) => Ok(Command::Apply(Intent::MarkDone { id: parse_id(id)? })),
        ("delete", [id]) => Ok(Command::Apply(Intent::DeleteTask { id: parse_id(id)? })),
        ("version", []) => Ok(Command::Version),
        _ => Err(USAGE.to_string()),
    }
}

fn parse_id(value: &str) -> Result<TaskId, String> {
    value
        .parse::<TaskId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| format!("invalid task id `{value}`"))
}

fn print_tasks(controller: &TaskListController) {
    println!("filter={}", controller.filter());
    for task in controller.visible_tasks() {
        let mark = if task.is_completed { "x" } else { " " };
        println!("{}\t[{mark}]\t{}", task.id, task.title);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command};
    use todolist_core::{Intent, TaskFilter};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_mutations_into_intents() {
        assert_eq!(
            parse_command(&args(&["add", "Buy", "Milk"])).unwrap(),
            Command::Apply(Intent::AddTask {
                title: "Buy Milk".to_string()
            })
        );
        assert_eq!(
            parse_command(&args(&["rename", "3", "Go", "home"])).unwrap(),
            Command::Apply(Intent::UpdateTask {
                id: 3,
                title: "Go home".to_string()
            })
        );
        assert_eq!(
            parse_command(&args(&["done", "2"])).unwrap(),
            Command::Apply(Intent::MarkDone { id: 2 })
        );
    }

    #[test]
    fn parses_list_filters() {
        assert_eq!(
            parse_command(&args(&["list"])).unwrap(),
            Command::Show(TaskFilter::ShowAll)
        );
        assert_eq!(
            parse_command(&args(&["list", "done"])).unwrap(),
            Command::Show(TaskFilter::ShowOnlyDone)
        );
        assert!(parse_command(&args(&["list", "someday"])).is_err());
    }

    #[test]
    fn rejects_bad_ids_and_unknown_commands() {
        assert!(parse_command(&args(&["delete", "abc"])).is_err());
        assert!(parse_command(&args(&["done", "0"])).is_err());
        assert!(parse_command(&args(&["archive", "1"])).is_err());
        assert!(parse_command(&args(&[])).is_err());
    }
}
