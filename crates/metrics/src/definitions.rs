//! Metric name definitions.

/// Ephemeral room lifecycle metrics
pub mod rooms {
    /// Personal rooms created and registered
    pub const CREATED_TOTAL: &str = "tempvoice_rooms_created_total";
    /// Members moved back into a room they already own
    pub const REUSED_TOTAL: &str = "tempvoice_rooms_reused_total";
    /// Empty rooms deleted and unregistered
    pub const DELETED_TOTAL: &str = "tempvoice_rooms_deleted_total";
    /// Provisioning attempts that failed (create or move)
    pub const PROVISION_FAILURES_TOTAL: &str = "tempvoice_rooms_provision_failures_total";
    /// Deletions of empty rooms that failed
    pub const CLEANUP_FAILURES_TOTAL: &str = "tempvoice_rooms_cleanup_failures_total";
    /// Rooms currently registered
    pub const ACTIVE: &str = "tempvoice_rooms_active";
    /// Time from provisioning request to member moved, in seconds
    pub const PROVISION_DURATION_SECONDS: &str = "tempvoice_rooms_provision_duration_seconds";
}

/// Setup command metrics
pub mod setup {
    /// Setup command invocations
    pub const RUNS_TOTAL: &str = "tempvoice_setup_runs_total";
    /// Setup command invocations that failed
    pub const FAILURES_TOTAL: &str = "tempvoice_setup_failures_total";
}
