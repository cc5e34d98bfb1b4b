use crate::cli::actions::{Action, server};
use anyhow::Result;

// Single seam between parsed actions and their implementations; every
// variant of `Action` is matched here and nowhere else.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
    }
}
