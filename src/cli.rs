use clap::error::{ContextKind, ErrorKind};
use clap::Parser;
use std::ffi::OsString;

pub const VERSION_TEXT: &str = concat!(
    "FlyBy v",
    env!("CARGO_PKG_VERSION"),
    "\nA Terminal UI for Concourse CI"
);

const AFTER_HELP: &str = "\
Requirements:
  • fly CLI installed and available in PATH
  • Configured Concourse targets in ~/.flyrc

Navigation:
  • Use arrow keys or j/k to navigate
  • Press Enter to select items
  • Press / to search the current list
  • Press Esc to go back
  • Press q to quit";

#[derive(Parser, Debug)]
#[command(
    name = "flyby",
    about = "FlyBy - Terminal UI for Concourse CI",
    disable_version_flag = true,
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Show version information
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Enable verbose logging to $XDG_STATE_HOME/flyby/debug.log
    #[arg(long)]
    pub verbose: bool,

    /// Number of builds to list per job
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,
}

/// What `main` should do with the command line.
#[derive(Debug)]
pub enum Invocation {
    Run(Cli),
    Exit { code: i32, message: String },
}

pub fn parse<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    match Cli::try_parse_from(&args) {
        Ok(cli) if cli.version => Invocation::Exit {
            code: 0,
            message: VERSION_TEXT.to_string(),
        },
        Ok(cli) => Invocation::Run(cli),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => Invocation::Exit {
            code: 0,
            message: e.render().to_string(),
        },
        Err(e) => {
            let arg = e
                .get(ContextKind::InvalidArg)
                .map(ToString::to_string)
                .or_else(|| args.get(1).map(|a| a.to_string_lossy().into_owned()))
                .unwrap_or_default();
            Invocation::Exit {
                code: 1,
                message: format!("Unknown option: {arg}\nUse --help for usage information"),
            }
        }
    }
}
