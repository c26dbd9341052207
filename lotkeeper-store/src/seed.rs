use lotkeeper_core::{LotResult, Repositories};
use lotkeeper_shared::{ParkingSpot, User};
use tracing::info;

use crate::app_config::SeedConfig;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub spots_created: usize,
    pub users_created: usize,
}

/// Create configured spots and users that do not exist yet.
///
/// Runs before the server accepts requests, so it writes to the repositories
/// directly. Spots match on `(section, number)`, users on email.
pub async fn apply_seed(repos: &Repositories, seed: &SeedConfig) -> LotResult<SeedReport> {
    let mut report = SeedReport::default();

    let mut existing = repos.spots.list_spots().await?;
    for entry in &seed.spots {
        let spot = ParkingSpot::new(&entry.section, entry.number, entry.spot_type, entry.label.clone());
        let taken = existing
            .iter()
            .any(|s| s.section == spot.section && s.number == spot.number);
        if taken {
            continue;
        }
        repos.spots.save_spot(&spot).await?;
        existing.push(spot);
        report.spots_created += 1;
    }

    for entry in &seed.users {
        let user = User::new(&entry.first_name, &entry.last_name, &entry.email, entry.role);
        if repos.users.find_by_email(&user.email).await?.is_some() {
            continue;
        }
        repos.users.save_user(&user).await?;
        report.users_created += 1;
    }

    info!(
        "Seed applied: {} spots, {} users created",
        report.spots_created, report.users_created
    );
    Ok(report)
}
