//! Show command: read and render the current SSHD settings.

use sshdctl_core::{Appliance, CoreError, FieldTable, Reconciler};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (appliance, target) = config::resolve_appliance(global)?;

    let settings = Appliance::oneshot(appliance, |gateway| async move {
        let state = Reconciler::new(FieldTable::sshd(), gateway)
            .current_state()
            .await?;
        Ok::<_, CoreError>(state.to_report_map())
    })
    .await
    .map_err(|e| CliError::from_core(e, &target))?;

    let out = output::render_settings(&global.output, &settings);
    output::print_output(&out, global.quiet);
    Ok(())
}
