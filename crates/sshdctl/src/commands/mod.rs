//! Command dispatch: bridges CLI args -> core reconciler -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod show;
pub mod util;

use clap::CommandFactory;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    tracing::debug!(command = ?cmd, "dispatching command");
    match cmd {
        Command::Apply(args) => apply::handle(args, global).await,
        Command::Show => show::handle(global).await,
        // Local only: no appliance connection.
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "sshdctl", &mut std::io::stdout());
            Ok(())
        }
    }
}
