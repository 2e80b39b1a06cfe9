use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use substrate::{Coordinator, DatumStore, LogDatumStore, MockOracle, SubstrateConfig};
use substrate_lens::{Kind, PrimitiveKind};
use substrate_schema_track::Migration;

/// Operator CLI for the substrate engine (§6 "CLI surface"). Every
/// subcommand opens the durable Datum Track log at `--data`, runs one
/// operation to completion, and exits -- there is no long-lived daemon
/// here, matching the engine's "library with an optional admin shell"
/// framing rather than a server process.
#[derive(Parser)]
#[clap(name = "substrate-admin", version)]
struct Cli {
    /// Path to the durable Datum Track append log.
    #[clap(short, long, global = true, default_value = "substrate.log")]
    data: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Registers a table (if absent) and applies a JSON migration plan to
    /// it. Schema Track state is scoped to this one invocation -- only the
    /// Datum Track log at `--data` persists across runs (see DESIGN.md).
    Migrate {
        /// Path to a JSON migration plan (see [`MigrationPlan`]).
        plan: PathBuf,
    },
    /// Re-runs classification for every record still tagged `layer=unknown`.
    Reclassify,
    /// Dumps every derived edge recorded for `namespace` as a JSON array.
    DumpEdges {
        /// The namespace whose `<namespace>::edges` partition to read.
        namespace: String,
    },
    /// Exports every datum in `namespace` to a JSON file at `path`.
    ExportLog {
        /// The namespace to export.
        namespace: String,
        /// Destination file for the JSON export.
        path: PathBuf,
    },
}

/// The on-disk shape of a `migrate` plan file. Migration steps can't
/// deserialize straight into [`substrate_schema_track::Migration`] (it
/// carries no `Serialize`/`Deserialize` impl, deliberately -- it is an
/// in-process vocabulary, not a wire format), so the CLI parses its own
/// small JSON dialect and lowers it into that vocabulary itself.
#[derive(serde::Deserialize)]
struct MigrationPlan {
    table: String,
    primary_key: String,
    primary_key_kind: String,
    #[serde(default)]
    steps: Vec<MigrationStep>,
}

#[derive(serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum MigrationStep {
    AddColumn { name: String, kind: String },
    DropColumn { name: String },
    AddIndex { name: String, column: String },
}

fn parse_kind(kind: &str) -> anyhow::Result<Kind> {
    Ok(match kind {
        "null" => Kind::Null,
        "boolean" => Kind::Primitive(PrimitiveKind::Boolean),
        "number" => Kind::Primitive(PrimitiveKind::Number),
        "text" => Kind::Primitive(PrimitiveKind::Text),
        "array" => Kind::Array,
        "object" => Kind::Object,
        other => bail!("unknown column kind '{other}' (expected null/boolean/number/text/array/object)"),
    })
}

fn open_coordinator(data: &PathBuf) -> anyhow::Result<(Coordinator, futures::channel::mpsc::Receiver<substrate::Event>)> {
    let store: Arc<dyn DatumStore> = Arc::new(LogDatumStore::open(data).context("opening datum log")?);
    let oracle = Arc::new(MockOracle::new());
    Ok(Coordinator::new(store, oracle, SubstrateConfig::default()))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Migrate { plan } => {
            let raw = std::fs::read_to_string(&plan).context("reading migration plan")?;
            let plan: MigrationPlan = serde_json::from_str(&raw).context("parsing migration plan")?;
            let primary_key_kind = parse_kind(&plan.primary_key_kind)?;

            let (coordinator, _events) = open_coordinator(&cli.data)?;
            if coordinator
                .register_table(plan.table.clone(), plan.primary_key, primary_key_kind)
                .is_err()
            {
                // Already registered in a prior invocation's in-memory
                // state is impossible (nothing persists it), so this
                // branch means the plan named a table twice in one run;
                // treat it as already-applied and continue.
            }

            for step in plan.steps {
                let migration = match step {
                    MigrationStep::AddColumn { name, kind } => Migration::AddColumn { name, kind: parse_kind(&kind)? },
                    MigrationStep::DropColumn { name } => Migration::DropColumn { name },
                    MigrationStep::AddIndex { name, column } => Migration::AddIndex { name, column },
                };
                let applied = coordinator
                    .apply_migration(&plan.table, migration)
                    .context("applying migration")?;
                if applied {
                    println!("applied migration to {}", plan.table);
                } else {
                    println!("migration already reflected in {}'s schema, skipped", plan.table);
                }
            }
            Ok(())
        }
        Command::Reclassify => {
            let (coordinator, _events) = open_coordinator(&cli.data)?;
            let recovered = coordinator.reclassify_pending().await?;
            println!("reclassified {recovered} record(s)");
            Ok(())
        }
        Command::DumpEdges { namespace } => {
            let (coordinator, _events) = open_coordinator(&cli.data)?;
            let edges = coordinator.edges(&namespace)?;
            println!("{}", serde_json::to_string_pretty(&edges)?);
            Ok(())
        }
        Command::ExportLog { namespace, path } => {
            let (coordinator, _events) = open_coordinator(&cli.data)?;
            let datums = coordinator.datum_store().list(&namespace, 0, None);
            let rows: Vec<_> = datums
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "id": d.id().to_string(),
                        "namespace": d.namespace(),
                        "content": d.content(),
                        "created_at": d.created_at(),
                        "causal_parent": d.causal_parent().map(|p| p.to_string()),
                        "metadata": d.metadata(),
                    })
                })
                .collect();
            std::fs::write(&path, serde_json::to_vec_pretty(&rows)?).context("writing export file")?;
            println!("exported {} record(s) to {}", rows.len(), path.display());
            Ok(())
        }
    }
}

/// Exit codes per §6: `0` success, `2` invalid invocation, `3` transient
/// failure (I/O, oracle unavailability), `4` integrity violation.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(substrate_err) = err.downcast_ref::<substrate::Error>() {
        if substrate_err.is_fatal() {
            return ExitCode::from(4);
        }
        return ExitCode::from(3);
    }
    if err.downcast_ref::<std::io::Error>().is_some() || err.downcast_ref::<serde_json::Error>().is_some() {
        return ExitCode::from(2);
    }
    ExitCode::from(3)
}

fn main() -> ExitCode {
    substrate::init_tracing();
    let cli = Cli::parse();
    match async_std::task::block_on(run(cli)) {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            eprintln!("error: {err:?}");
            exit_code_for(&err)
        }
    }
}
