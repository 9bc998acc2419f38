use super::open_client;
use crate::api::AuthProvider;
use crate::libs::messages::Message;
use crate::{msg_success, msg_warning};
use anyhow::Result;

/// Signs out and forgets the stored session.
///
/// Task state lives only in the store of a single command, so there is
/// nothing else to clear here.
pub async fn cmd() -> Result<()> {
    let (_, client) = open_client()?;

    if client.current_user().await.ok().flatten().is_none() {
        msg_warning!(Message::NotSignedIn);
        return Ok(());
    }

    if let Err(e) = client.sign_out().await {
        tracing::warn!(error = %e, "remote sign-out failed, local session cleared");
    }
    msg_success!(Message::SignedOut);
    Ok(())
}
