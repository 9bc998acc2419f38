use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_error_anyhow, msg_print, msg_success};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Debug, Subcommand)]
enum GroupCommand {
    #[command(about = "Show the known groups")]
    List,
    #[command(about = "Add a group")]
    Add { name: String },
    #[command(about = "Remove a group; existing tasks keep it")]
    Remove { name: String },
}

pub fn cmd(args: GroupArgs) -> Result<()> {
    let mut config = Config::read()?;
    match args.command {
        GroupCommand::List => {
            msg_print!(Message::GroupsHeader, true);
            View::groups(config.groups().as_slice());
        }
        GroupCommand::Add { name } => {
            config
                .groups_mut()
                .add(&name)
                .map_err(|e| msg_error_anyhow!(Message::TaskOperationFailed(e.to_string())))?;
            config.save()?;
            msg_success!(Message::GroupAdded(name.trim().to_string()));
        }
        GroupCommand::Remove { name } => {
            config
                .groups_mut()
                .remove(&name)
                .map_err(|e| msg_error_anyhow!(Message::TaskOperationFailed(e.to_string())))?;
            config.save()?;
            msg_success!(Message::GroupRemoved(name.trim().to_string()));
        }
    }
    Ok(())
}
