//! Session state machines: one per registration kind, each a direct
//! analogue of the original `pub_connect` / `sub_connect` / `box_creation`
//! / `box_removal` / `box_listing` handlers, now running on one of the
//! broker's worker threads instead of inline on the only thread.

mod manager;
mod publisher;
mod subscriber;

use mbroker_proto::RegistrationFrame;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::registry::BoxRegistry;

/// Downgrades a "client gone" error (spec.md §7: `ENOENT` on open, `EPIPE`
/// on write) into the clean `Ok(())` outcome the session handlers return
/// for it, logging at `info` instead of letting it surface as the `warn!`
/// `dispatch` reserves for a session that failed unexpectedly. Any other
/// error passes through untouched.
///
/// Callers run this only after any registry-side cleanup (closing a
/// publisher/subscriber handle) the session still owed has already run,
/// so a client going away mid-session never leaks a publisher or
/// subscriber count.
pub(crate) fn clean_outcome(result: Result<(), SessionError>) -> Result<(), SessionError> {
    match result {
        Err(err) if err.is_client_gone() => {
            info!(%err, "client gone, ending session cleanly");
            Ok(())
        }
        other => other,
    }
}

/// Dispatches one dequeued registration to its session handler.
///
/// Errors here are broker-side failures (a client pipe that can't be
/// opened or misbehaves mid-protocol); they're logged by the caller and
/// do not take the broker down, mirroring a single client's bad behavior
/// never being allowed to affect any other session.
pub fn dispatch(registry: &BoxRegistry, registration: RegistrationFrame) -> Result<(), SessionError> {
    let result = match registration {
        RegistrationFrame::Publisher { client_pipe, box_name } => {
            publisher::run(registry, &client_pipe, &box_name)
        }
        RegistrationFrame::Subscriber { client_pipe, box_name } => {
            subscriber::run(registry, &client_pipe, &box_name)
        }
        RegistrationFrame::BoxCreate { client_pipe, box_name } => {
            manager::run_create(registry, &client_pipe, &box_name)
        }
        RegistrationFrame::BoxRemove { client_pipe, box_name } => {
            manager::run_remove(registry, &client_pipe, &box_name)
        }
        RegistrationFrame::BoxList { client_pipe } => manager::run_list(registry, &client_pipe),
    };
    if let Err(err) = &result {
        warn!(%err, "session ended with an error");
    }
    result
}
