//! CLI for fokuslern.
//!
//! Runs the focus agent against JSON input: single decisions, JSONL replays
//! of activity and feedback events, and read-only views of the learned model.
//! Results go to stdout as JSON; logs go to stderr (`RUST_LOG`, default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fokuslern_agent::{AgentConfig, FocusAgent, SnapshotStore};
use fokuslern_core::{now_local, Activity, ActivityContext, Feedback};
use fokuslern_feedback::SuggestionContext;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (missing fields use defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model snapshot path; overrides the config file and FOKUSLERN_MODEL_PATH
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide on an intervention for one activity
    ///
    /// Reads `{"activity": {...}, "context": {...}}` from stdin unless
    /// `--app` is given.
    Decide {
        /// Foreground application name
        #[arg(long)]
        app: Option<String>,

        /// Window title
        #[arg(long, default_value = "")]
        title: String,

        /// Session duration in minutes
        #[arg(long, default_value = "0")]
        minutes: f64,

        /// Mark the activity as productive
        #[arg(long)]
        productive: bool,

        /// Recent productivity ratio in [0, 1]
        #[arg(long, default_value = "0.5")]
        productivity: f64,

        /// App switches during the last hour
        #[arg(long, default_value = "0")]
        switches: u32,
    },
    /// Replay a JSONL stream of activity and feedback events, then save
    Replay {
        /// Input file path
        #[arg(long)]
        path: PathBuf,
    },
    /// Print personalized suggestions
    Suggestions {
        /// Hour of day (0-23); defaults to the local clock
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..24))]
        hour: Option<u8>,
    },
    /// Print model statistics, patterns and recommendations
    Insights,
    /// Delete the model snapshot
    Reset,
}

#[derive(Deserialize, Debug, Default)]
struct DecideRequest {
    #[serde(default)]
    activity: Activity,
    #[serde(default)]
    context: ActivityContext,
}

/// One line of a replay file.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayEvent {
    Activity {
        #[serde(default)]
        activity: Activity,
        #[serde(default)]
        context: ActivityContext,
        #[serde(default, with = "time::serde::rfc3339::option")]
        at: Option<OffsetDateTime>,
    },
    /// Without `intervention_id` the most recent intervention is meant.
    Feedback {
        #[serde(default)]
        intervention_id: Option<String>,
        #[serde(default)]
        feedback: Feedback,
        #[serde(default, with = "time::serde::rfc3339::option")]
        at: Option<OffsetDateTime>,
    },
}

#[derive(Serialize, Debug, Default, PartialEq)]
struct ReplaySummary {
    activities: u64,
    interventions: u64,
    feedback_applied: u64,
    feedback_ignored: u64,
    saved: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(config: Option<&Path>, model: Option<&Path>) -> Result<AgentConfig> {
    let base = match config {
        Some(path) => AgentConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => AgentConfig::default(),
    };
    let mut config = base.apply_env().context("Invalid environment override")?;
    if let Some(model) = model {
        config.model_path = model.to_path_buf();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn read_decide_request() -> Result<DecideRequest> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    if input.trim().is_empty() {
        return Ok(DecideRequest::default());
    }
    serde_json::from_str(&input).context("Invalid decide request on stdin")
}

fn replay(agent: &FocusAgent, reader: impl BufRead, out: &mut impl Write) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut last_intervention: Option<String> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(&line)
            .with_context(|| format!("Invalid event on line {}", idx + 1))?;

        match event {
            ReplayEvent::Activity {
                activity,
                context,
                at,
            } => {
                let outcome =
                    agent.process_activity_at(&activity, &context, at.unwrap_or_else(now_local));
                summary.activities += 1;
                if let Some(id) = &outcome.intervention_id {
                    summary.interventions += 1;
                    last_intervention = Some(id.clone());
                }
                serde_json::to_writer(&mut *out, &outcome)?;
                writeln!(out)?;
            }
            ReplayEvent::Feedback {
                intervention_id,
                feedback,
                at,
            } => {
                let Some(id) = intervention_id.or_else(|| last_intervention.take()) else {
                    tracing::warn!("line {}: feedback without a preceding intervention", idx + 1);
                    summary.feedback_ignored += 1;
                    continue;
                };
                match agent.process_feedback_at(&id, feedback, at.unwrap_or_else(now_local)) {
                    Some(_) => summary.feedback_applied += 1,
                    None => {
                        tracing::warn!("line {}: unknown intervention {id}", idx + 1);
                        summary.feedback_ignored += 1;
                    }
                }
            }
        }
    }

    summary.saved = agent.save_model();
    Ok(summary)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.model.as_deref())?;

    match cli.command {
        Commands::Decide {
            app,
            title,
            minutes,
            productive,
            productivity,
            switches,
        } => {
            let request = match app {
                Some(app_name) => DecideRequest {
                    activity: Activity {
                        app_name,
                        window_title: title,
                        is_productive: productive,
                        duration_minutes: minutes,
                    },
                    context: ActivityContext {
                        recent_productivity: productivity,
                        app_switches_last_hour: switches,
                    },
                },
                None => read_decide_request()?,
            };
            let agent = FocusAgent::new(config).context("Failed to initialize agent")?;
            let outcome = agent.process_activity(&request.activity, &request.context);
            print_json(&outcome)?;
        }
        Commands::Replay { path } => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let agent = FocusAgent::new(config).context("Failed to initialize agent")?;
            let mut out = io::stdout().lock();
            let summary = replay(&agent, BufReader::new(file), &mut out)?;
            serde_json::to_writer(&mut out, &summary)?;
            writeln!(out)?;
        }
        Commands::Suggestions { hour } => {
            let agent = FocusAgent::new(config).context("Failed to initialize agent")?;
            print_json(&agent.get_suggestions(&SuggestionContext { current_hour: hour }))?;
        }
        Commands::Insights => {
            let agent = FocusAgent::new(config).context("Failed to initialize agent")?;
            print_json(&agent.get_model_insights())?;
        }
        Commands::Reset => {
            let store = SnapshotStore::new(&config.model_path);
            let removed = store
                .remove()
                .with_context(|| format!("Failed to remove {}", store.path().display()))?;
            print_json(&serde_json::json!({
                "removed": removed,
                "path": store.path().display().to_string(),
            }))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use time::macros::datetime;

    fn agent(name: &str) -> FocusAgent {
        let dir = std::env::temp_dir().join(format!("fokuslern_cli_{}_{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        FocusAgent::new(AgentConfig {
            initial_epsilon: 0.0,
            epsilon_floor: 0.0,
            seed: Some(3),
            model_path: dir.join("model.json"),
            ..AgentConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn replay_event_parses_both_kinds() {
        let activity: ReplayEvent = serde_json::from_str(
            r#"{"type":"activity","activity":{"app_name":"reddit"},"at":"2024-03-04T10:30:00Z"}"#,
        )
        .unwrap();
        match activity {
            ReplayEvent::Activity { activity, at, .. } => {
                assert_eq!(activity.app_name, "reddit");
                assert_eq!(at, Some(datetime!(2024-03-04 10:30:00 UTC)));
            }
            other => panic!("unexpected {other:?}"),
        }

        let feedback: ReplayEvent =
            serde_json::from_str(r#"{"type":"feedback","feedback":{"helpful":true}}"#).unwrap();
        assert!(matches!(
            feedback,
            ReplayEvent::Feedback {
                intervention_id: None,
                ..
            }
        ));
    }

    #[test]
    fn replay_applies_feedback_to_latest_intervention() {
        let agent = agent("latest");
        let input = concat!(
            r#"{"type":"activity","activity":{"app_name":"youtube","duration_minutes":30},"at":"2024-03-04T10:30:00Z"}"#,
            "\n",
            r#"{"type":"feedback","feedback":{"helpful":true,"user_action":"acted"},"at":"2024-03-04T10:31:00Z"}"#,
            "\n\n",
            r#"{"type":"feedback","feedback":{"helpful":false}}"#,
            "\n",
        );
        let mut out = Vec::new();
        let summary = replay(&agent, Cursor::new(input), &mut out).unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                activities: 1,
                interventions: 1,
                feedback_applied: 1,
                feedback_ignored: 1,
                saved: true,
            }
        );
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
        assert_eq!(agent.feedback_count(), 1);
    }

    #[test]
    fn replay_reports_the_bad_line() {
        let agent = agent("bad_line");
        let input = "{\"type\":\"activity\"}\n{\"type\":\"teleport\"}\n";
        let err = replay(&agent, Cursor::new(input), &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn model_flag_overrides_config() {
        let config = load_config(None, Some(Path::new("/tmp/elsewhere.json"))).unwrap();
        assert_eq!(config.model_path, PathBuf::from("/tmp/elsewhere.json"));
    }
}
