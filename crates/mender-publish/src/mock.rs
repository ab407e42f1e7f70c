//! Recording [`CodeHost`] double for tests.
//!
//! Kept in the library (not behind `cfg(test)`) so downstream crates'
//! integration tests can drive the publisher and pipeline without a real
//! `gh` session.

use std::sync::Mutex;

use async_trait::async_trait;

use mender_core::MenderError;

use crate::host::CodeHost;

/// One recorded review-request creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedRequest {
    pub base: String,
    pub head: String,
    pub title: String,
    pub body: String,
}

/// In-memory code host that records calls and fails on demand.
#[derive(Default)]
pub struct MockHost {
    /// Value returned by `auth_status`.
    pub authenticated: bool,
    /// When `true`, `open_review_request` fails.
    pub fail_review_requests: bool,
    opened: Mutex<Vec<OpenedRequest>>,
    token_logins: Mutex<Vec<String>>,
}

impl MockHost {
    /// A host with an existing valid session.
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    /// Make every `open_review_request` call fail.
    pub fn failing_reviews(mut self) -> Self {
        self.fail_review_requests = true;
        self
    }

    /// Review requests opened so far.
    pub fn opened(&self) -> Vec<OpenedRequest> {
        self.opened.lock().expect("mock lock").clone()
    }

    /// Tokens passed to `login_with_token` so far.
    pub fn token_logins(&self) -> Vec<String> {
        self.token_logins.lock().expect("mock lock").clone()
    }
}

#[async_trait]
impl CodeHost for MockHost {
    async fn auth_status(&self) -> Result<bool, MenderError> {
        Ok(self.authenticated)
    }

    async fn login_with_token(&self, token: &str) -> Result<(), MenderError> {
        self.token_logins
            .lock()
            .expect("mock lock")
            .push(token.to_string());
        Ok(())
    }

    async fn login_interactive(&self) -> Result<bool, MenderError> {
        Ok(false)
    }

    async fn open_review_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<(), MenderError> {
        if self.fail_review_requests {
            return Err(MenderError::Publish("mock host rejected the request".into()));
        }
        self.opened.lock().expect("mock lock").push(OpenedRequest {
            base: base.into(),
            head: head.into(),
            title: title.into(),
            body: body.into(),
        });
        Ok(())
    }
}
