//! Client-side controller for the bridge integration panel: concurrent status
//! aggregation, lifecycle/sync action dispatch and build requests.

pub mod build;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod render;
pub mod routes;
pub mod status;
pub mod transport;
#[cfg(test)]
mod test_utils;

pub use controller::{
    NoticeKind, PanelController, PanelNotice, PanelOptions, PanelPhase, PanelUiState,
};
pub use error::{PanelError, RequestError, RouteError};
pub use routes::Action;
pub use status::{AggregateState, Snapshot};
