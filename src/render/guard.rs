//! Ownership of a browser session for the length of one render.

use std::any::Any;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::browser::EngineSession;
use crate::{PressError, Result};

/// Owns one session and closes it exactly once.
///
/// Call [`SessionGuard::release`] on every path. A guard dropped without
/// release (a cancelled future, for instance) schedules the close on the
/// runtime it was created in.
pub struct SessionGuard {
    session: Option<Box<dyn EngineSession>>,
    close_timeout: Duration,
    runtime: Option<Handle>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn EngineSession>, close_timeout: Duration) -> Self {
        Self {
            session: Some(session),
            close_timeout,
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn session(&mut self) -> Result<&mut dyn EngineSession> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(PressError::engine_fault("browser session already released")),
        }
    }

    /// Closes the session, killing it if close fails or stalls. Never errors.
    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            shutdown(session, self.close_timeout).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match &self.runtime {
            Some(handle) => {
                debug!("session guard dropped without release; closing in background");
                handle.spawn(shutdown(session, self.close_timeout));
            }
            None => warn!("session guard dropped outside a runtime; browser left to exit with the process"),
        }
    }
}

async fn shutdown(mut session: Box<dyn EngineSession>, close_timeout: Duration) {
    match tokio::time::timeout(close_timeout, session.close()).await {
        Ok(Ok(())) => debug!("browser session closed"),
        Ok(Err(err)) => {
            warn!(error = %err, "browser close failed; killing process");
            session.kill().await;
        }
        Err(_) => {
            warn!(?close_timeout, "browser close timed out; killing process");
            session.kill().await;
        }
    }
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
