use std::net::SocketAddr;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total queries executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "aula_queries_total";

/// Histogram: query latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "aula_query_duration_seconds";

// ── Booking domain ──────────────────────────────────────────────

/// Counter: bookings accepted (any initial status).
pub const BOOKINGS_CREATED_TOTAL: &str = "aula_bookings_created_total";

/// Counter: active bookings superseded by a higher-priority request.
pub const BOOKINGS_OVERRIDDEN_TOTAL: &str = "aula_bookings_overridden_total";

/// Counter: booking requests the arbiter rejected.
pub const BOOKING_CONFLICTS_TOTAL: &str = "aula_booking_conflicts_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "aula_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "aula_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "aula_connections_rejected_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "aula_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "aula_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::RegisterUser { .. } => "register_user",
        Command::AddBuilding { .. } => "add_building",
        Command::RemoveBuilding { .. } => "remove_building",
        Command::AddFloor { .. } => "add_floor",
        Command::RemoveFloor { .. } => "remove_floor",
        Command::AddRoom { .. } => "add_room",
        Command::RemoveRoom { .. } => "remove_room",
        Command::RequestBooking { .. } => "request_booking",
        Command::CancelBooking { .. } => "cancel_booking",
        Command::ApproveBooking { .. } => "approve_booking",
        Command::RejectBooking { .. } => "reject_booking",
        Command::SelectSlots { .. } => "select_slots",
        Command::SelectBookings { .. } => "select_bookings",
        Command::SelectRooms => "select_rooms",
        Command::SelectStats => "select_stats",
    }
}
