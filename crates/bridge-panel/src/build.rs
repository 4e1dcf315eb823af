use std::sync::Arc;
use std::time::Duration;

use bridge_protocol::BuildProfile;

use crate::dispatch::ActionDispatcher;
use crate::error::PanelError;
use crate::status::AggregateState;

pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(120);

/// Build requests ride on the dispatcher with a profile body and the long
/// timeout. A timeout is reported as a failed build: the server may still be
/// working, and the next refresh of the build list is the only source of
/// truth.
pub struct BuildRequestFlow {
    dispatcher: Arc<ActionDispatcher>,
    timeout: Duration,
}

impl BuildRequestFlow {
    pub fn new(dispatcher: Arc<ActionDispatcher>, timeout: Duration) -> Self {
        Self {
            dispatcher,
            timeout,
        }
    }

    pub async fn request_build(&self, profile: BuildProfile) -> Result<AggregateState, PanelError> {
        let request = self.dispatcher.routes().build_request(profile, self.timeout);
        self.dispatcher
            .execute(&request)
            .await
            .map_err(|source| PanelError::Build { profile, source })?;
        self.dispatcher.refresh().await
    }
}
