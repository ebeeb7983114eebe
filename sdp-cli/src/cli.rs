use clap::{ArgAction, Parser, Subcommand};
use sdp_scsi::TimerRequest;

#[derive(Parser, Debug)]
#[command(name = "sdp", version, about, after_help = TIMER_HELP)]
pub struct Opt {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    /// Specifies the subcommand to execute.
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List disks and their fixed volumes.
    #[command(visible_alias = "l")]
    List {
        /// Physical drive numbers. All drives when omitted.
        disks: Vec<u32>,
    },

    /// List power condition timers.
    #[command(visible_alias = "wl")]
    Timers {
        /// Physical drive numbers. All drives when omitted.
        disks: Vec<u32>,
    },

    /// Write power condition timers, in seconds.
    #[command(visible_alias = "w", after_help = TIMER_HELP)]
    WriteTimers {
        /// Timer request, e.g. `Z7200` or `a1800z3600`.
        timers: TimerRequest,

        /// Physical drive numbers.
        #[arg(required = true)]
        disks: Vec<u32>,
    },

    /// Lock and dismount all volumes of a disk, then spin it down.
    #[command(visible_alias = "p")]
    Stop {
        /// Physical drive numbers.
        #[arg(required = true)]
        disks: Vec<u32>,
    },

    /// Command to generate shell completion
    GenerateCompletion {
        /// Specifies the target shell type for completion
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Whether the command talks to devices.
    pub const fn needs_elevation(&self) -> bool {
        !matches!(self, Self::GenerateCompletion { .. })
    }
}

const TIMER_HELP: &str = "\
Timers: [I|A#][B#][C#][Y#][S|Z#], case-insensitive, # in seconds
  sdp write-timers Z7200 5         Standby_Z of drive 5 to 7200 seconds
  sdp w a1800z3600 3               Idle_A to 1800 and Standby_Z to 3600
Power consumption: Idle_A >= Idle_B >= Idle_C > Standby_Y >= Standby_Z

Avoid excessively low timer values. Short spin down/up and head unload/load
cycles can harm your hard drives!";
