use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in against the registry and sync the local user
    Login {
        /// Email, member number or national id
        #[arg(long)]
        identifier: String,

        #[arg(long, env = "IDSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the first.last token derived from a name
    NormalizeName { first: String, last: String },

    /// Print a login identifier in its canonical form
    NormalizeId { identifier: String },

    /// Print the permission strings for a roles document
    FlattenRoles { file: PathBuf },
}
