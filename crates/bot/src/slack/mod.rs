//! Slack connectivity: Web API calls, the Socket Mode event stream and the
//! responders handlers talk through.

pub(crate) mod api;
pub(crate) mod responder;
pub(crate) mod socket;

pub(crate) use api::SlackApi;
pub(crate) use responder::{
    DryRun, SlackFiles, SlackJoinResponder, SlackNotifier, SlackResponder,
};
pub(crate) use socket::{InboundEvent, SocketMode};
