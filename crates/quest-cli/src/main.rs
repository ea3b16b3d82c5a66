use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use contracts::{EngineConfig, McqAnswerRequest, SubmissionRequest};
use quest_api::{serve, QuestApi};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("quest-cli <command>");
    println!("commands:");
    println!("  player");
    println!("  zones");
    println!("  problems <zone>");
    println!("  next <zone>");
    println!("  mcq <zone>");
    println!("  submit <zone> <problem_id> <source_file>");
    println!("  answer <mcq_id> <choice_index>");
    println!("  set-name <name>");
    println!("  reset");
    println!("  leaderboard");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  save file: quest_save.sqlite (override with QUEST_SQLITE_PATH)");
}

fn default_sqlite_path() -> String {
    std::env::var("QUEST_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "quest_save.sqlite".to_string())
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn open_api() -> Result<QuestApi, String> {
    let mut api = QuestApi::from_config(EngineConfig::default());
    let sqlite_path = default_sqlite_path();
    api.attach_sqlite_store(PathBuf::from(&sqlite_path))
        .map_err(|err| format!("failed to open save file {sqlite_path}: {err}"))?;
    Ok(api)
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("error: failed to render response: {err}"),
    }
}

fn run_command(args: &[String]) -> Result<(), String> {
    let command = args.get(1).map(String::as_str);
    match command {
        Some("player") => {
            let mut api = open_api()?;
            print_json(&api.player_profile());
            Ok(())
        }
        Some("zones") => {
            let mut api = open_api()?;
            print_json(&api.list_zones());
            Ok(())
        }
        Some("problems") => {
            let zone_id = args.get(2).ok_or_else(|| "missing zone".to_string())?;
            let mut api = open_api()?;
            let problems = api.problems_in_zone(zone_id).map_err(|err| err.to_string())?;
            print_json(&problems);
            Ok(())
        }
        Some("next") => {
            let zone_id = args.get(2).ok_or_else(|| "missing zone".to_string())?;
            let mut api = open_api()?;
            let next = api.next_problem(zone_id).map_err(|err| err.to_string())?;
            print_json(&next);
            Ok(())
        }
        Some("mcq") => {
            let zone_id = args.get(2).ok_or_else(|| "missing zone".to_string())?;
            let mut api = open_api()?;
            let next = api.next_mcq(zone_id).map_err(|err| err.to_string())?;
            print_json(&next);
            Ok(())
        }
        Some("submit") => {
            let zone_id = args.get(2).ok_or_else(|| "missing zone".to_string())?;
            let problem_id = args.get(3).ok_or_else(|| "missing problem_id".to_string())?;
            let source_file = args.get(4).ok_or_else(|| "missing source_file".to_string())?;
            let source = std::fs::read_to_string(source_file)
                .map_err(|err| format!("failed to read {source_file}: {err}"))?;

            let mut api = open_api()?;
            let outcome = api
                .evaluate_submission(&SubmissionRequest {
                    problem_id: problem_id.clone(),
                    zone_id: zone_id.clone(),
                    source,
                })
                .map_err(|err| err.to_string())?;
            print_json(&outcome);
            Ok(())
        }
        Some("answer") => {
            let mcq_id = args.get(2).ok_or_else(|| "missing mcq_id".to_string())?;
            let choice = args
                .get(3)
                .ok_or_else(|| "missing choice_index".to_string())?
                .parse::<usize>()
                .map_err(|_| "invalid choice_index".to_string())?;

            let mut api = open_api()?;
            let outcome = api
                .answer_mcq(&McqAnswerRequest {
                    mcq_id: mcq_id.clone(),
                    choice,
                })
                .map_err(|err| err.to_string())?;
            print_json(&outcome);
            Ok(())
        }
        Some("set-name") => {
            let name = args.get(2).ok_or_else(|| "missing name".to_string())?;
            let mut api = open_api()?;
            let profile = api.set_name(name).map_err(|err| err.to_string())?;
            print_json(&profile);
            Ok(())
        }
        Some("reset") => {
            let mut api = open_api()?;
            let profile = api.reset_player().map_err(|err| err.to_string())?;
            print_json(&profile);
            Ok(())
        }
        Some("leaderboard") => {
            let mut api = open_api()?;
            print_json(&api.leaderboard());
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some("serve") {
        match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                let api = match open_api() {
                    Ok(api) => api,
                    Err(err) => {
                        eprintln!("error: {err}");
                        std::process::exit(1);
                    }
                };
                println!("serving api on http://{addr}");
                if let Err(err) = serve(addr, api).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        return;
    }

    if let Err(err) = run_command(&args) {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}
