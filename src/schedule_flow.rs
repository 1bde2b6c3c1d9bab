use chrono::{DateTime, Utc};

/// Steps a visitor goes through when booking a slot on someone's calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScheduleFlow {
    #[default]
    PickingDateTime,
    Confirming {
        scheduled_at: DateTime<Utc>,
    },
}

impl ScheduleFlow {
    pub fn new(selected: Option<DateTime<Utc>>) -> Self {
        match selected {
            Some(scheduled_at) => Self::Confirming { scheduled_at },
            None => Self::PickingDateTime,
        }
    }

    pub fn select_date_time(self, scheduled_at: DateTime<Utc>) -> Self {
        Self::Confirming { scheduled_at }
    }

    pub fn cancel_confirmation(self) -> Self {
        Self::PickingDateTime
    }

    pub fn selected_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Confirming { scheduled_at } => Some(*scheduled_at),
            Self::PickingDateTime => None,
        }
    }
}
