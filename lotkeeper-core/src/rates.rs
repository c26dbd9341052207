use std::collections::HashMap;

use chrono::Duration;
use lotkeeper_shared::VehicleType;
use serde::{Deserialize, Serialize};

/// Prices a closed parking session, in cents.
pub trait RateFunction: Send + Sync {
    fn cost(&self, duration: Duration, spot_type: VehicleType) -> i64;
}

/// Same price for every session regardless of length
#[derive(Debug, Clone, Copy)]
pub struct FlatRate(pub i64);

impl RateFunction for FlatRate {
    fn cost(&self, _duration: Duration, _spot_type: VehicleType) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    /// Sessions up to this long are free
    #[serde(default = "default_grace_minutes")]
    pub grace_minutes: i64,

    /// Price per started hour, keyed by spot type
    #[serde(default = "default_hourly_cents")]
    pub hourly_cents: HashMap<VehicleType, i64>,

    /// Billable hours per 24h block
    #[serde(default = "default_daily_cap_hours")]
    pub daily_cap_hours: i64,
}

fn default_grace_minutes() -> i64 {
    10
}

fn default_daily_cap_hours() -> i64 {
    10
}

fn default_hourly_cents() -> HashMap<VehicleType, i64> {
    let mut m = HashMap::new();
    m.insert(VehicleType::Car, 300);
    m.insert(VehicleType::Motorcycle, 150);
    m.insert(VehicleType::Truck, 600);
    m.insert(VehicleType::Bus, 800);
    m.insert(VehicleType::Van, 400);
    m.insert(VehicleType::Bicycle, 50);
    m
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            grace_minutes: default_grace_minutes(),
            hourly_cents: default_hourly_cents(),
            daily_cap_hours: default_daily_cap_hours(),
        }
    }
}

/// Hourly pricing with a free grace period and a daily cap
#[derive(Debug, Clone)]
pub struct TieredRate {
    config: RateConfig,
}

impl TieredRate {
    pub fn new(config: RateConfig) -> Self {
        Self { config }
    }

    fn hourly(&self, spot_type: VehicleType) -> i64 {
        // Types missing from a partial config fall back to the built-in table.
        self.config
            .hourly_cents
            .get(&spot_type)
            .copied()
            .or_else(|| default_hourly_cents().get(&spot_type).copied())
            .unwrap_or(0)
    }
}

impl Default for TieredRate {
    fn default() -> Self {
        Self::new(RateConfig::default())
    }
}

impl RateFunction for TieredRate {
    fn cost(&self, duration: Duration, spot_type: VehicleType) -> i64 {
        let seconds = duration.num_seconds().max(0);
        if seconds <= self.config.grace_minutes * 60 {
            return 0;
        }

        let hourly = self.hourly(spot_type);
        let cap_hours = self.config.daily_cap_hours.clamp(1, 24);

        // Billed per started hour
        let hours = (seconds + 3599) / 3600;
        let days = hours / 24;
        let remainder = hours % 24;

        days * cap_hours * hourly + remainder.min(cap_hours) * hourly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grace_period_is_free() {
        let rate = TieredRate::default();
        assert_eq!(rate.cost(Duration::minutes(10), VehicleType::Car), 0);
        assert_eq!(rate.cost(Duration::zero(), VehicleType::Truck), 0);
    }

    #[test]
    fn test_started_hours_are_billed() {
        let rate = TieredRate::default();
        assert_eq!(rate.cost(Duration::minutes(11), VehicleType::Car), 300);
        assert_eq!(rate.cost(Duration::minutes(61), VehicleType::Car), 600);
        assert_eq!(rate.cost(Duration::hours(2), VehicleType::Motorcycle), 300);
    }

    #[test]
    fn test_daily_cap() {
        let rate = TieredRate::default();

        // 15 hours capped at 10
        assert_eq!(rate.cost(Duration::hours(15), VehicleType::Car), 3000);

        // One full day plus two hours
        assert_eq!(rate.cost(Duration::hours(26), VehicleType::Car), 3000 + 600);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: RateConfig = serde_json::from_str(r#"{"hourly_cents": {"car": 500}}"#).unwrap();
        let rate = TieredRate::new(config);

        assert_eq!(rate.cost(Duration::hours(1), VehicleType::Car), 500);
        assert_eq!(rate.cost(Duration::hours(1), VehicleType::Bus), 800);
    }

    #[test]
    fn test_flat_rate() {
        assert_eq!(FlatRate(250).cost(Duration::hours(30), VehicleType::Van), 250);
    }
}
