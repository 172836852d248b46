//! FlatStore CLI
//!
//! Command-line front end: runs one operation against a table file and
//! prints the resulting envelope as JSON.

use clap::{Parser, Subcommand};
use flatstore::{Command, Config, Engine, Envelope, Filters};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// FlatStore CLI
#[derive(Parser, Debug)]
#[command(name = "flatstore-cli")]
#[command(about = "CLI for the FlatStore flat-file record store")]
#[command(version)]
struct Args {
    /// Table file path
    #[arg(short, long, default_value = "./flatstore_data/table.csv")]
    table: String,

    /// Comma-separated column names (system_id is added automatically)
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Milliseconds to wait for a busy lock (0 = fail immediately)
    #[arg(short, long, default_value = "0")]
    wait_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List rows matching every column=value filter
    Select {
        /// Filter in column=value form (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// List rows where any field contains the keyword
    Search {
        /// Case-insensitive keyword (empty matches everything)
        #[arg(default_value = "")]
        keyword: String,
    },

    /// Insert a record given as a JSON object
    Insert {
        /// e.g. '{"name":"Allen","status":"active"}'
        data: String,
    },

    /// Update the record with the given id
    Update {
        /// Record id
        id: String,

        /// Fields to overwrite, as a JSON object
        data: String,
    },

    /// Delete the record with the given id
    Delete {
        /// Record id
        id: String,
    },
}

fn main() {
    // Logs go to stderr; stdout carries only the envelope
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flatstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("FlatStore CLI v{}", flatstore::VERSION);

    let config = Config::builder()
        .table_path(&args.table)
        .columns(args.columns.clone())
        .lock_wait_ms(args.wait_ms)
        .build();

    let envelope = match build_command(args.command) {
        Ok(command) => match Engine::open(config) {
            Ok(engine) => engine.execute(command),
            Err(e) => {
                tracing::error!("Failed to open table {}: {}", args.table, e);
                Envelope::from_error(&e)
            }
        },
        Err(message) => Envelope::failure(message),
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!("Failed to encode envelope: {}", e);
            std::process::exit(2);
        }
    }

    if !envelope.success {
        std::process::exit(1);
    }
}

/// Turn parsed arguments into an engine command
fn build_command(command: Commands) -> Result<Command, String> {
    Ok(match command {
        Commands::Select { filters } => Command::Select {
            filters: parse_filters(&filters)?,
        },
        Commands::Search { keyword } => Command::Search { keyword },
        Commands::Insert { data } => Command::Insert {
            data: parse_json(&data)?,
        },
        Commands::Update { id, data } => Command::Update {
            id,
            data: parse_json(&data)?,
        },
        Commands::Delete { id } => Command::Delete { id },
    })
}

/// "status=active" → ("status", "active")
fn parse_filters(raw: &[String]) -> Result<Filters, String> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(column, value)| (column.trim().to_string(), value.to_string()))
                .ok_or_else(|| format!("Invalid filter '{}': expected column=value", pair))
        })
        .collect()
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("Invalid JSON record: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_filters_splits_on_first_equals() {
        let filters = parse_filters(&strings(&[" status =active", "formula==1+1", "note="])).unwrap();

        assert_eq!(filters.len(), 3);
        assert_eq!(filters["status"], "active");
        assert_eq!(filters["formula"], "=1+1");
        assert_eq!(filters["note"], "");
    }

    #[test]
    fn test_parse_filters_rejects_missing_equals() {
        let err = parse_filters(&strings(&["status=active", "status"])).unwrap_err();
        assert!(err.contains("Invalid filter 'status'"));
    }

    #[test]
    fn test_build_select_and_search() {
        match build_command(Commands::Select {
            filters: strings(&["name=Allen"]),
        }) {
            Ok(Command::Select { filters }) => assert_eq!(filters["name"], "Allen"),
            other => panic!("expected Select, got {:?}", other),
        }

        match build_command(Commands::Search {
            keyword: "al".to_string(),
        }) {
            Ok(Command::Search { keyword }) => assert_eq!(keyword, "al"),
            other => panic!("expected Search, got {:?}", other),
        }
    }

    #[test]
    fn test_build_insert_and_update_parse_json() {
        match build_command(Commands::Insert {
            data: r#"{"name":"Allen","age":30}"#.to_string(),
        }) {
            Ok(Command::Insert { data }) => assert_eq!(data, json!({ "name": "Allen", "age": 30 })),
            other => panic!("expected Insert, got {:?}", other),
        }

        match build_command(Commands::Update {
            id: "7".to_string(),
            data: r#"{"status":"done"}"#.to_string(),
        }) {
            Ok(Command::Update { id, data }) => {
                assert_eq!(id, "7");
                assert_eq!(data, json!({ "status": "done" }));
            }
            other => panic!("expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_build_rejects_malformed_json() {
        let err = build_command(Commands::Insert {
            data: "{name: Allen".to_string(),
        })
        .unwrap_err();
        assert!(err.starts_with("Invalid JSON record"));

        let err = build_command(Commands::Update {
            id: "1".to_string(),
            data: "not json".to_string(),
        })
        .unwrap_err();
        assert!(err.starts_with("Invalid JSON record"));
    }

    #[test]
    fn test_build_delete_passes_id_through() {
        match build_command(Commands::Delete { id: "42".to_string() }) {
            Ok(Command::Delete { id }) => assert_eq!(id, "42"),
            other => panic!("expected Delete, got {:?}", other),
        }
    }

    #[test]
    fn test_args_parse_columns_and_filters() {
        let args = Args::try_parse_from([
            "flatstore-cli",
            "--columns",
            "name,status",
            "select",
            "-f",
            "status=active",
        ])
        .unwrap();

        assert_eq!(args.columns, strings(&["name", "status"]));
        assert_eq!(args.wait_ms, 0);
        assert!(matches!(args.command, Commands::Select { ref filters } if filters.len() == 1));
    }
}
