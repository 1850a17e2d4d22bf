//! Firing the agent spawn
//!
//! The spawn request is best effort: whatever goes wrong is written to the
//! run log with a `FATAL:` tag and the run still finishes normally.

use inbox_client::AgentTrigger;
use inbox_core::{ActivityLog, TriggerOutcome};

/// Ask `trigger` to spawn its agent and record how it went
pub async fn fire<T>(trigger: &T, log: &ActivityLog) -> TriggerOutcome
where
    T: AgentTrigger + ?Sized,
{
    log.info(&format!(
        "New comment found, spawning '{}' agent via /tools/invoke.",
        trigger.agent_id()
    ))
    .await;

    match trigger.spawn_agent().await {
        Ok(response) => {
            log.success(&format!(
                "Agent spawn request accepted by gateway. Response: {}",
                response
            ))
            .await;
            TriggerOutcome::Accepted { response }
        }
        Err(e) => {
            log.fatal(&format!(
                "Failed to spawn agent via /tools/invoke. Error: {}",
                e
            ))
            .await;
            TriggerOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
