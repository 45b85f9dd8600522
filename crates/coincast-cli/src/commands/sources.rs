use coincast_core::SourceRouter;
use serde_json::json;

use crate::error::CliError;

use super::CommandResult;

pub fn run(router: &SourceRouter) -> Result<CommandResult, CliError> {
    let snapshots = router.snapshots();

    let rows: Vec<_> = snapshots
        .iter()
        .map(|snapshot| {
            json!({
                "source": snapshot.id,
                "status": snapshot.status_label(),
            })
        })
        .collect();

    let source_chain = snapshots.iter().map(|snapshot| snapshot.id).collect();

    Ok(CommandResult::ok(json!({ "sources": rows }), source_chain))
}
