//! What the CLI resolves to after parsing. The server is the only action
//! today; new subcommands become new variants here.

pub mod server;

mod run;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}

impl Action {
    /// Run the action to completion.
    ///
    /// # Errors
    /// Returns whatever error the underlying action produced.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
