//! Daily login rewards and streak tracking.

use crate::constants::{rewards, timing};

/// Outcome of a successful daily claim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyLoginReward {
    pub streak: u32,
    pub base: f64,
    pub bonus: f64,
}

impl DailyLoginReward {
    pub fn total(&self) -> f64 {
        self.base + self.bonus
    }
}

/// Evaluate a daily claim at `now`. `last_claim == 0` means never claimed.
///
/// Returns `None` while less than 24h have passed since the last claim.
/// A claim within 36h of the previous one extends the streak; anything
/// later starts over at day 1.
pub fn evaluate_daily_login(last_claim: u64, streak: u32, now: u64) -> Option<DailyLoginReward> {
    let since = (last_claim > 0).then(|| now.saturating_sub(last_claim));

    if matches!(since, Some(gap) if gap < timing::MS_PER_DAY) {
        return None;
    }

    let streak = match since {
        Some(gap) if gap < timing::STREAK_GRACE_MS => streak.saturating_add(1),
        _ => 1,
    };

    Some(DailyLoginReward {
        streak,
        base: rewards::DAILY_LOGIN,
        bonus: streak_bonus(streak),
    })
}

/// Milestone bonus paid on the day the streak reaches it.
pub fn streak_bonus(streak: u32) -> f64 {
    match streak {
        7 => rewards::STREAK_DAY_7_BONUS,
        30 => rewards::STREAK_DAY_30_BONUS,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = timing::MS_PER_DAY;
    const HOUR: u64 = timing::MS_PER_HOUR;

    #[test]
    fn test_first_claim() {
        let r = evaluate_daily_login(0, 0, 5 * DAY).unwrap();
        assert_eq!(r.streak, 1);
        assert_eq!(r.total(), 10.0);
    }

    #[test]
    fn test_refused_within_a_day() {
        assert!(evaluate_daily_login(DAY, 1, DAY + 23 * HOUR).is_none());
    }

    #[test]
    fn test_streak_continues_within_grace() {
        let r = evaluate_daily_login(DAY, 3, DAY + 30 * HOUR).unwrap();
        assert_eq!(r.streak, 4);
    }

    #[test]
    fn test_streak_resets_after_grace() {
        let r = evaluate_daily_login(DAY, 3, DAY + 40 * HOUR).unwrap();
        assert_eq!(r.streak, 1);
    }

    #[test]
    fn test_milestones() {
        let r = evaluate_daily_login(DAY, 6, 2 * DAY).unwrap();
        assert_eq!(r.streak, 7);
        assert_eq!(r.bonus, 25.0);

        let r = evaluate_daily_login(DAY, 29, 2 * DAY).unwrap();
        assert_eq!(r.total(), 110.0);

        assert_eq!(streak_bonus(8), 0.0);
    }

    #[test]
    fn test_streak_saturates() {
        let r = evaluate_daily_login(DAY, u32::MAX, 2 * DAY).unwrap();
        assert_eq!(r.streak, u32::MAX);
        assert_eq!(r.bonus, 0.0);
    }
}
