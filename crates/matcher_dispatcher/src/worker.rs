use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::context::WorkerContext;
use crate::task::{DispatchTask, TaskKind, TaskOutcome};

pub(crate) struct WorkItem {
    pub task: DispatchTask,
    pub respond_to: oneshot::Sender<TaskOutcome>,
}

/// A worker's main loop: signal readiness, then process tasks off its own
/// queue one at a time until the queue is closed.
pub(crate) async fn run(
    ctx: WorkerContext,
    mut inbox: mpsc::Receiver<WorkItem>,
    ready: oneshot::Sender<()>,
) {
    if ready.send(()).is_err() {
        warn!(worker_id = ctx.worker_id, "readiness signal dropped, pool start already gave up");
        return;
    }
    info!(worker_id = ctx.worker_id, "worker ready");

    while let Some(item) = inbox.recv().await {
        let outcome = execute(&ctx, &item.task.kind).await;
        debug!(
            worker_id = ctx.worker_id,
            task_id = %item.task.task_id,
            "task completed"
        );
        let _ = item.respond_to.send(outcome);
    }

    info!(worker_id = ctx.worker_id, "worker shutting down, queue closed");
}

async fn execute(ctx: &WorkerContext, kind: &TaskKind) -> TaskOutcome {
    match kind {
        TaskKind::MatchRide {
            user_id,
            destination_lat,
            destination_lng,
            passenger_count,
            luggage_units,
        } => match ctx
            .engine
            .match_rider(
                user_id,
                *destination_lat,
                *destination_lng,
                *passenger_count,
                *luggage_units,
            )
            .await
        {
            Ok(outcome) => TaskOutcome::Matched(outcome),
            Err(e) => TaskOutcome::Failed(e.to_string()),
        },
        TaskKind::RemoveUser { user_id } => match ctx.engine.remove_from_pool(user_id).await {
            Ok(()) => TaskOutcome::Removed,
            Err(e) => TaskOutcome::Failed(e.to_string()),
        },
        TaskKind::RemoveUserFromTrip { user_id } => {
            match ctx.engine.remove_from_trip(user_id).await {
                Ok(payload) => TaskOutcome::RiderLeft(payload),
                Err(e) => TaskOutcome::Failed(e.to_string()),
            }
        }
    }
}
