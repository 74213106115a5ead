#![forbid(unsafe_code)]

//! `navshell` binary entry point.

use std::fs::File;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use navshell_dashboard::app::{DashboardShell, ShellDeps};
use navshell_dashboard::auth::{AuthProvider, StaticAuth, User};
use navshell_dashboard::billing::{BillingService, FixedBilling, JsonFileBilling};
use navshell_dashboard::cli;
use navshell_dashboard::routing::MemoryRouter;
use navshell_runtime::{MonotonicClock, Program, ProgramConfig, SignalBus};
use tracing_subscriber::EnvFilter;

/// Install a file-backed tracing subscriber; stdout belongs to the UI.
fn init_tracing(opts: &cli::Opts) -> std::io::Result<()> {
    let file = File::create(&opts.log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    if opts.log_json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
    Ok(())
}

fn main() {
    let opts = cli::Opts::parse();

    if let Err(e) = init_tracing(&opts) {
        eprintln!("Failed to open log file {}: {e}", opts.log_file.display());
        std::process::exit(1);
    }

    let auth: Arc<dyn AuthProvider> = if opts.signed_in {
        Arc::new(StaticAuth::signed_in(User::new(
            opts.user_id.as_str(),
            opts.email.as_str(),
        )))
    } else {
        Arc::new(StaticAuth::signed_out())
    };
    let billing: Arc<dyn BillingService> = match &opts.snapshot {
        Some(path) => Arc::new(JsonFileBilling::new(path.clone())),
        None => Arc::new(FixedBilling::default()),
    };
    let deps = ShellDeps {
        router: Arc::new(MemoryRouter::new(&opts.url)),
        auth,
        billing,
        bus: SignalBus::new(),
        clock: Arc::new(MonotonicClock::new()),
    };

    let mut model = DashboardShell::new(deps);
    if opts.exit_after_ms > 0 {
        model = model.with_exit_after(Duration::from_millis(opts.exit_after_ms));
    }

    let config = ProgramConfig {
        mouse: opts.mouse,
        ..ProgramConfig::default()
    };
    match Program::with_config(model, config) {
        Ok(mut program) => {
            if let Err(e) = program.run() {
                eprintln!("Runtime error: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    }
}
