use std::{fs, io, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

const BIN_NAME: &str = "sdp";

#[derive(Parser)]
struct Opt {
    #[command(subcommand)]
    /// Specifies the subcommand to execute.
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Manpage for CLI
    CliMan {
        /// Directory to save manpages
        out_dir: PathBuf,
    },
    /// Generate bash, zsh and fish completions for CLI
    ShellCompletion {
        /// Directory to save completion scripts
        out_dir: PathBuf,
    },
}

fn main() -> io::Result<()> {
    let opts = Opt::parse();

    match opts.command {
        Commands::CliMan { out_dir } => {
            fs::create_dir_all(&out_dir)?;
            let cmd = sdp_cli::Opt::command();
            clap_mangen::generate_to(cmd, out_dir)
        }
        Commands::ShellCompletion { out_dir } => {
            fs::create_dir_all(&out_dir)?;
            let mut cmd = sdp_cli::Opt::command();
            for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
                let path = clap_complete::generate_to(shell, &mut cmd, BIN_NAME, &out_dir)?;
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}
