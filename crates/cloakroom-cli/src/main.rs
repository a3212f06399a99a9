use cloakroom_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_add, run_clean, run_init, run_list,
    run_remove, run_restore,
};
use cloakroom_lib::error::CloakroomError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), CloakroomError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Init(params) => run_init(params).await?,
        ResolvedCommand::Add(params) => run_add(params).await?,
        ResolvedCommand::Remove(params) => run_remove(params).await?,
        ResolvedCommand::List(params) => run_list(params).await?,
        ResolvedCommand::Clean(params) => run_clean(params).await?,
        ResolvedCommand::Restore(params) => run_restore(params).await?,
    }

    Ok(())
}
