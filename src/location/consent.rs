//! Foreground permission: asks the user once per session.
//!
//! [`Consented`] wraps a provider and owns the permission decision.
//! In `ask` mode it hands a [`PermissionPrompt`] to whoever drives the
//! UI and waits for the answer. The answer is cached, so the prompt is
//! shown at most once for the lifetime of the wrapper.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::model::Fix;

use super::{LocationProvider, PermissionStatus, ProviderError};

/// How the foreground permission is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPolicy {
    /// Prompt the user the first time location is requested.
    #[default]
    Ask,
    /// Grant without asking.
    Granted,
    /// Deny without asking.
    Denied,
}

/// A question waiting for the user's answer.
#[derive(Debug)]
pub struct PermissionPrompt {
    reply: oneshot::Sender<PermissionStatus>,
    consent: Arc<OnceLock<PermissionStatus>>,
}

impl PermissionPrompt {
    /// Record the user's answer for the session and wake the requester.
    ///
    /// The answer is kept even if the requester has gone away.
    pub fn answer(self, status: PermissionStatus) {
        let _ = self.consent.set(status);
        let _ = self.reply.send(status);
    }

    /// Whether the request that raised this prompt has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }
}

/// A provider whose permission request goes through the session's consent.
pub struct Consented {
    inner: Box<dyn LocationProvider>,
    policy: PermissionPolicy,
    prompts: Option<mpsc::UnboundedSender<PermissionPrompt>>,
    decision: Mutex<Option<PermissionStatus>>,
    /// The user's answer, set by the prompt itself.
    consent: Arc<OnceLock<PermissionStatus>>,
}

impl Consented {
    pub fn new(
        inner: Box<dyn LocationProvider>,
        policy: PermissionPolicy,
        prompts: Option<mpsc::UnboundedSender<PermissionPrompt>>,
    ) -> Self {
        Self {
            inner,
            policy,
            prompts,
            decision: Mutex::new(None),
            consent: Arc::new(OnceLock::new()),
        }
    }

    async fn ask_user(&self) -> PermissionStatus {
        if let Some(status) = self.consent.get() {
            return *status;
        }
        let Some(prompts) = &self.prompts else {
            tracing::warn!("permission policy is ask but nothing can prompt; denying");
            return PermissionStatus::Denied;
        };

        let (reply, answer) = oneshot::channel();
        let prompt = PermissionPrompt {
            reply,
            consent: Arc::clone(&self.consent),
        };
        if prompts.send(prompt).is_err() {
            return PermissionStatus::Denied;
        }
        answer.await.unwrap_or(PermissionStatus::Denied)
    }
}

#[async_trait]
impl LocationProvider for Consented {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        // Held across the prompt so concurrent requests share one answer.
        let mut decision = self.decision.lock().await;
        if let Some(status) = *decision {
            return status;
        }

        let status = match self.policy {
            PermissionPolicy::Denied => PermissionStatus::Denied,
            PermissionPolicy::Granted => self.inner.request_foreground_permission().await,
            PermissionPolicy::Ask => match self.ask_user().await {
                PermissionStatus::Granted => self.inner.request_foreground_permission().await,
                PermissionStatus::Denied => PermissionStatus::Denied,
            },
        };

        tracing::info!(?status, policy = ?self.policy, "foreground permission decided");
        *decision = Some(status);
        status
    }

    async fn current_position(&self) -> Result<Fix, ProviderError> {
        self.inner.current_position().await
    }
}
