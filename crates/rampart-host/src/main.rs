//! Boots a rampart host, reports its breaker status and shuts down.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use rampart_host::{Host, HostCollaborators, StructuredHealthReporter, SystemConfigLoader};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let Ok(mut host) =
        Host::bootstrap_with(&SystemConfigLoader, reporter, HostCollaborators::default())
    else {
        return ExitCode::FAILURE;
    };

    let status = serde_json::to_string_pretty(&host.breakers().status());
    let written = status
        .map_err(io::Error::from)
        .and_then(|json| writeln!(io::stdout().lock(), "{json}"));
    let failures = host.shutdown();

    if written.is_err() || !failures.is_empty() {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
