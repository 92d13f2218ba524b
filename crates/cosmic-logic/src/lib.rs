//! Pure progression logic for Cosmic Voyage.
//!
//! This crate holds every rule of the play-to-explore ledger that does not
//! depend on storage, network, or a clock. Time-dependent operations take an
//! explicit `now` in epoch milliseconds, so the same code runs under the
//! client session, the headless simtest, and unit tests.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`accrual`] | Whole-hour passive income, holdings rates, set bonuses |
//! | [`achievements`] | Achievement table and unlocked/next queries |
//! | [`catalog`] | Celestial bodies and their fixed discovery order |
//! | [`challenges`] | Discovery-count challenges and eligibility |
//! | [`constants`] | Rewards, rates, timing windows |
//! | [`daily`] | Daily login reward and streak rules |
//! | [`discovery`] | Discovery records and prefix validation on rehydration |
//! | [`immortality`] | Derived immortality score and tiers |
//! | [`ledger`] | The owned progression ledger and its commands |
//! | [`utilities`] | Burnable cosmic utilities and their costs |

pub mod accrual;
pub mod achievements;
pub mod catalog;
pub mod challenges;
pub mod constants;
pub mod daily;
pub mod discovery;
pub mod immortality;
pub mod ledger;
pub mod utilities;
