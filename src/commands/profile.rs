use super::open_client;
use crate::api::AuthProvider;
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::{msg_bail_anyhow, msg_error_anyhow, msg_info, msg_success};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// New display name
    #[arg(short, long)]
    name: Option<String>,

    /// Prompt for a new password
    #[arg(short, long)]
    password: bool,
}

pub async fn cmd(args: ProfileArgs) -> Result<()> {
    let (_, client) = open_client()?;
    if client.current_user().await.ok().flatten().is_none() {
        msg_bail_anyhow!(Message::NotSignedIn);
    }

    let name = args.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if name.is_none() && !args.password {
        msg_info!(Message::NothingToUpdate);
        return Ok(());
    }

    if let Some(name) = name {
        client
            .update_profile(&name)
            .await
            .map_err(|e| msg_error_anyhow!(Message::AuthFailed(e.to_string())))?;
        msg_success!(Message::ProfileUpdated(name));
    }
    if args.password {
        let password = Secret::prompt_new(&Message::PromptNewPassword.to_string())?;
        client
            .update_password(&password)
            .await
            .map_err(|e| msg_error_anyhow!(Message::AuthFailed(e.to_string())))?;
        msg_success!(Message::PasswordUpdated);
    }
    Ok(())
}
