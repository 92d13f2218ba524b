//! Game constants: rewards, rates, timing windows.
//!
//! Plain `const` values with no storage or network dependency. The client
//! crate, the simtest harness, and the ledger all read from here.

pub mod timing {
    pub const MS_PER_HOUR: u64 = 3_600_000;
    pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;
    /// A daily login claimed within this window of the previous one keeps the streak.
    pub const STREAK_GRACE_MS: u64 = MS_PER_DAY + MS_PER_DAY / 2;
}

pub mod rewards {
    pub const DAILY_LOGIN: f64 = 10.0;
    pub const STREAK_DAY_7_BONUS: f64 = 25.0;
    pub const STREAK_DAY_30_BONUS: f64 = 100.0;
    /// One-time grant issued by the remote authority on first wallet claim.
    pub const GENESIS_BONUS: f64 = 10.0;
}

pub mod passive {
    /// Flat accrual rate used by the ledger's hourly passive step.
    pub const TOKENS_PER_HOUR: f64 = 0.5;

    pub const INNER_SET_BONUS: f64 = 25.0;
    pub const OUTER_SET_BONUS: f64 = 50.0;
    pub const ALL_PLANETS_BONUS: f64 = 100.0;

    pub const INNER_PLANETS: [&str; 4] = ["Mercury", "Venus", "Earth", "Mars"];
    pub const OUTER_PLANETS: [&str; 4] = ["Jupiter", "Saturn", "Uranus", "Neptune"];
}

pub mod immortality {
    pub const DISCOVERY_WEIGHT: u64 = 10;
    pub const STREAK_WEIGHT: u64 = 2;

    // Lower bounds of each tier (inclusive)
    pub const BURNING_SOUL: u64 = 501;
    pub const STELLAR_COLLECTOR: u64 = 2_001;
    pub const IMMORTAL_COLLECTOR: u64 = 10_001;
    pub const COSMIC_DEITY: u64 = 50_001;
}
