use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use sdp_cli::{Commands, Opt, commands, elevation, exit_code, render};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let opt = Opt::parse();
    init_tracing(opt.verbose);

    if let Commands::GenerateCompletion { shell } = opt.command {
        generate_completion(shell);
        return ExitCode::SUCCESS;
    }

    let out = console::Term::stdout();
    let err = console::Term::stderr();

    // Broken pipes and closed consoles end up here; nothing left to report them on.
    let _ = render::write_banner(&mut &out);

    if opt.command.needs_elevation() && !elevation::is_elevated() {
        let _ = render::write_error(&mut &err, "Please run as administrator.");
        return ExitCode::from(exit_code::NOT_ELEVATED);
    }

    let ids = match &opt.command {
        Commands::List { disks }
        | Commands::Timers { disks }
        | Commands::WriteTimers { disks, .. }
        | Commands::Stop { disks } => disks.as_slice(),
        Commands::GenerateCompletion { .. } => &[],
    };

    let mut set = match sdp_disklist::open(ids) {
        Ok(set) => set,
        Err(e) => {
            tracing::debug!("Disk set: {e:?}");
            let _ = render::write_error(&mut &err, &e);
            return ExitCode::from(exit_code::DISK_SET);
        }
    };

    let res = match &opt.command {
        Commands::List { .. } => commands::list(&mut set, false, &mut &out).map(|()| true),
        Commands::Timers { .. } => commands::list(&mut set, true, &mut &out).map(|()| true),
        Commands::WriteTimers { timers, .. } => {
            commands::write_timers(&mut set, timers, &mut &out, &mut &err)
        }
        Commands::Stop { .. } => commands::stop(&mut set, &mut &out, &mut &err),
        Commands::GenerateCompletion { .. } => Ok(true),
    };

    match res {
        Ok(true) => ExitCode::from(exit_code::SUCCESS),
        Ok(false) => ExitCode::from(exit_code::FAILED),
        Err(e) => {
            tracing::error!("Console output failed: {e}");
            ExitCode::from(exit_code::FAILED)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };

    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(console::Term::stderr().is_term()),
        )
        .try_init();
}

fn generate_completion(target: clap_complete::Shell) {
    let mut cmd = Opt::command();
    const BIN_NAME: &str = "sdp";

    clap_complete::generate(target, &mut cmd, BIN_NAME, &mut std::io::stdout())
}
