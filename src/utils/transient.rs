//! Short-lived replies: messages that delete themselves after a delay.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use poise::{CreateReply, serenity_prelude as serenity};
use serenity::{Http, Message};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{Context, Error};

/// A pending deferred action. Dropping it does not cancel the action; call [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct DeferredAction {
    handle: JoinHandle<()>,
}

impl DeferredAction {
    /// Abort the action if it has not run yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Run `action` once `delay` has elapsed.
pub fn schedule<F>(delay: Duration, action: F) -> DeferredAction
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        action.await;
    });
    DeferredAction { handle }
}

/// Delete `message` after `delay`. Failures (message already gone, missing permissions) are only logged.
pub fn delete_message_after(http: Arc<Http>, message: Message, delay: Duration) -> DeferredAction {
    schedule(delay, async move {
        if let Err(e) = message.delete(&http).await {
            debug!("Failed to delete transient message {}: {}", message.id, e);
        }
    })
}

/// Send a reply that removes itself after the configured error-message lifetime.
pub async fn send_transient(ctx: Context<'_>, reply: CreateReply) -> Result<DeferredAction, Error> {
    let lifetime = ctx.data().config.error_message_lifetime;
    let handle = ctx.send(reply).await?;
    let message = handle.into_message().await?;

    Ok(delete_message_after(
        ctx.serenity_context().http.clone(),
        message,
        lifetime,
    ))
}
