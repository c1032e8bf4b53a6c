// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::AppointmentStatus;

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    /// Booked is the only state that moves; Cancelled and Completed are terminal.
    pub fn valid_transitions(current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Booked => &[AppointmentStatus::Cancelled, AppointmentStatus::Completed],
            AppointmentStatus::Cancelled | AppointmentStatus::Completed => &[],
        }
    }

    pub fn can_transition(current_status: AppointmentStatus, new_status: AppointmentStatus) -> bool {
        let allowed = Self::valid_transitions(current_status).contains(&new_status);
        if allowed {
            debug!("Status transition allowed: {} -> {}", current_status, new_status);
        } else {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booked_can_be_cancelled_or_completed() {
        assert!(AppointmentLifecycleService::can_transition(AppointmentStatus::Booked, AppointmentStatus::Cancelled));
        assert!(AppointmentLifecycleService::can_transition(AppointmentStatus::Booked, AppointmentStatus::Completed));
    }

    #[test]
    fn terminal_states_do_not_move() {
        for terminal in [AppointmentStatus::Cancelled, AppointmentStatus::Completed] {
            assert!(AppointmentLifecycleService::valid_transitions(terminal).is_empty());
        }
        assert!(!AppointmentLifecycleService::can_transition(AppointmentStatus::Completed, AppointmentStatus::Cancelled));
    }
}
