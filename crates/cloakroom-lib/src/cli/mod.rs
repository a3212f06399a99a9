mod add;
mod args;
mod clean;
mod init;
mod list;
mod params;
mod remove;
mod resolved_command;
mod restore;

pub use add::run_add;
pub use args::{Args, Command, parse_args};
pub use clean::run_clean;
pub use init::run_init;
pub use list::{format_plugin_list, run_list};
pub use params::{
    AddParams, CleanParams, FetchParams, InitParams, ListParams, RemoveParams, RestoreParams,
};
pub use remove::run_remove;
pub use resolved_command::{ResolvedCommand, resolve_command, resolve_command_in};
pub use restore::{format_report, run_fetch, run_restore};
