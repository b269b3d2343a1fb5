//! Startup resolution of the current primary.

use crate::monitor::client::{MonitorClient, MonitorError, MonitorLink};
use crate::monitor::event::FailoverEvent;

/// Ask the monitor who is primary for `group` right now.
///
/// The resulting event carries no previous address; reconciling it simply
/// forces the routing table toward the monitor's current answer.
pub async fn resolve_current(
    client: &MonitorClient,
    link: &mut dyn MonitorLink,
    group: &str,
) -> Result<FailoverEvent, MonitorError> {
    let primary = client.query(link, group).await?;
    tracing::debug!(
        group,
        address = %primary.endpoint(),
        endpoint = %link.endpoint(),
        "Resolved current primary"
    );
    Ok(FailoverEvent::current(primary))
}
