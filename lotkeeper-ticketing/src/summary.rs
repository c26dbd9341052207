use lotkeeper_core::{LotResult, LotView, Repositories};
use lotkeeper_shared::{SpotStatus, TicketStatus};
use serde::Serialize;

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSummary {
    pub total_spots: usize,
    pub free: usize,
    pub reserved: usize,
    pub occupied: usize,
    pub pending_tickets: usize,
    pub open_sessions: usize,
    pub revenue_cents: i64,
}

/// Computed from one consistent view of the store, without taking spot locks.
pub async fn summarize(repos: &Repositories) -> LotResult<LotSummary> {
    let LotView {
        spots,
        tickets,
        sessions,
    } = repos.transactions.view().await?;

    let count = |status: SpotStatus| spots.iter().filter(|s| s.status == status).count();

    Ok(LotSummary {
        total_spots: spots.len(),
        free: count(SpotStatus::Free),
        reserved: count(SpotStatus::Reserved),
        occupied: count(SpotStatus::Occupied),
        pending_tickets: tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Pending)
            .count(),
        open_sessions: sessions.iter().filter(|s| s.is_open()).count(),
        revenue_cents: sessions.iter().filter_map(|s| s.cost_cents).sum(),
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::{admin, attendant, fixture};
    use chrono::Duration;

    #[tokio::test]
    async fn test_summary_tracks_lifecycle() {
        let fx = fixture().await;
        let lot = &fx.lot;

        let empty = lot.summary().await.unwrap();
        assert_eq!(empty.total_spots, 2);
        assert_eq!(empty.free, 2);

        let ticket = lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        let summary = lot.summary().await.unwrap();
        assert_eq!((summary.reserved, summary.pending_tickets), (1, 1));

        lot.tickets.approve(ticket.id, admin(&fx).id).await.unwrap();
        let summary = lot.summary().await.unwrap();
        assert_eq!((summary.occupied, summary.open_sessions, summary.pending_tickets), (1, 1, 0));

        let session = lot.sessions.list_sessions(true).await.unwrap().remove(0);
        lot.sessions
            .close_session(session.id, session.check_in_at + Duration::minutes(30))
            .await
            .unwrap();
        let summary = lot.summary().await.unwrap();
        assert_eq!(summary.free, 2);
        assert_eq!(summary.revenue_cents, 300);
    }
}
