use std::path::Path;

use railsync_core::transport::{DryRunTransport, HttpTransport, Mutation};
use railsync_core::Orchestrator;

use crate::cli::SyncArgs;
use crate::error::CliError;
use crate::logging;
use crate::settings::{FileConfig, Settings};

pub async fn run_sync(args: SyncArgs, config_path: &Path) -> Result<(), CliError> {
    let dry_run = args.dry_run;
    let settings = Settings::load(config_path, sync_overrides(args))?;
    logging::init(settings.log.as_deref())?;
    tracing::debug!("Resolved settings: {:?}", settings);

    let transport = HttpTransport::new(settings.client)?;
    if dry_run {
        let planner = DryRunTransport::new(transport);
        let report = Orchestrator::new(&planner, settings.sync)?.sync().await?;
        let planned = planner.planned_mutations();
        if planned.is_empty() {
            println!("Dry run: destination already matches the source");
        } else {
            println!("Dry run: {} planned changes", planned.len());
            for mutation in &planned {
                println!("  {}", format_mutation(mutation));
            }
        }
        println!("{report}");
    } else {
        let report = Orchestrator::new(transport, settings.sync)?.sync().await?;
        println!("{report}");
    }
    Ok(())
}

pub fn sync_overrides(args: SyncArgs) -> FileConfig {
    FileConfig {
        source: args.source,
        destination: args.destination,
        delete: args.delete.value(),
        log: args.log,
        ..FileConfig::default()
    }
}

pub fn format_mutation(mutation: &Mutation) -> String {
    match mutation {
        Mutation::Create {
            kind, scope, label, ..
        } => format!("create {kind} '{label}' in {scope}"),
        Mutation::Delete { kind, id } => format!("delete {kind} {id}"),
    }
}
