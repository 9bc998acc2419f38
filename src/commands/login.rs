//! Account commands: sign-up, sign-in and password reset.

use super::open_client;
use crate::api::AuthProvider;
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::{msg_error_anyhow, msg_info, msg_success};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input};

#[derive(Debug, Args)]
pub struct SignupArgs {
    /// Account email; prompted when omitted
    #[arg(short, long)]
    email: Option<String>,

    /// Display name; prompted when omitted
    #[arg(short, long)]
    name: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email; prompted when omitted
    #[arg(short, long)]
    email: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResetArgs {
    #[arg(required = true)]
    email: String,
}

pub async fn signup(args: SignupArgs) -> Result<()> {
    let (_, client) = open_client()?;
    let email = prompt_or(args.email, Message::PromptEmail)?;
    let name = prompt_or(args.name, Message::PromptName)?;
    let password = Secret::prompt_new(&Message::PromptPassword.to_string())?;

    client
        .sign_up(&email, &password, &name)
        .await
        .map_err(|e| msg_error_anyhow!(Message::AuthFailed(e.to_string())))?;

    // Projects that require email confirmation return no session.
    match client.current_user().await {
        Ok(Some(_)) => msg_success!(Message::SignedUp(email)),
        _ => msg_info!(Message::SignUpPendingConfirmation(email)),
    }
    Ok(())
}

pub async fn login(args: LoginArgs) -> Result<()> {
    let (_, client) = open_client()?;
    let email = prompt_or(args.email, Message::PromptEmail)?;
    let password = Secret::prompt(&Message::PromptPassword.to_string())?;

    let user = client
        .sign_in(&email, &password)
        .await
        .map_err(|e| msg_error_anyhow!(Message::AuthFailed(e.to_string())))?;
    msg_success!(Message::SignedIn(user.name.unwrap_or(user.email)));
    Ok(())
}

pub async fn reset_password(args: ResetArgs) -> Result<()> {
    let (_, client) = open_client()?;
    let email = args.email.trim().to_string();
    client
        .send_password_reset(&email)
        .await
        .map_err(|e| msg_error_anyhow!(Message::AuthFailed(e.to_string())))?;
    msg_success!(Message::PasswordResetSent(email));
    Ok(())
}

fn prompt_or(value: Option<String>, prompt: Message) -> Result<String> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(value) => Ok(value),
        None => Ok(Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt.to_string())
            .interact_text()?),
    }
}
