use matcher_core::engine::MatchOutcome;
use matcher_core::ports::NotificationPayload;
use uuid::Uuid;

pub type TaskId = Uuid;

/// The three units of work a worker can be asked to run, named after the
/// engine operations they wrap.
#[derive(Debug, Clone)]
pub enum TaskKind {
    MatchRide {
        user_id: String,
        destination_lat: f64,
        destination_lng: f64,
        passenger_count: u32,
        luggage_units: u32,
    },
    RemoveUser {
        user_id: String,
    },
    RemoveUserFromTrip {
        user_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct DispatchTask {
    pub task_id: TaskId,
    pub kind: TaskKind,
}

impl DispatchTask {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            kind,
        }
    }
}

/// What a completed task resolves to.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Matched(MatchOutcome),
    Removed,
    RiderLeft(Option<NotificationPayload>),
    Failed(String),
}
