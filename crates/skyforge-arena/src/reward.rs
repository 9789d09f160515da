//! End-of-round reward review.

use skyforge_types::PlayerName;
use tracing::{debug, warn};

use crate::Arena;
use crate::settings::PrizeSettings;

/// What a player earned this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSummary {
    pub participation: u64,
    pub kills: u32,
    pub kill_coins: u64,
    pub win_coins: u64,
}

impl RewardSummary {
    /// `participation + per_kill × kills + (won ? win : 0)`.
    pub fn compute(prize: &PrizeSettings, kills: u32, won: bool) -> Self {
        Self {
            participation: prize.participation,
            kills,
            kill_coins: prize.per_kill.saturating_mul(u64::from(kills)),
            win_coins: if won { prize.win } else { 0 },
        }
    }

    pub fn total(&self) -> u64 {
        self.participation
            .saturating_add(self.kill_coins)
            .saturating_add(self.win_coins)
    }

    /// The review text, one line per non-zero part.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "You won {} coins.\n\n- Participation = {} coins\n",
            self.total(),
            self.participation
        );
        if self.kill_coins > 0 {
            text.push_str(&format!("- {} kills = {} coins\n", self.kills, self.kill_coins));
        }
        if self.win_coins > 0 {
            text.push_str(&format!("- 1 win = {} coins\n", self.win_coins));
        }
        text
    }
}

impl Arena {
    /// Presents the reward review to `target`, or to every participant and
    /// spectator when `target` is `None`, and credits each player's prize.
    ///
    /// A player is credited at most once per round: the `rewards` ledger is
    /// checked before paying, so calling this from the elimination path and
    /// again from the restart sequence pays once.
    pub fn review_rewards(&mut self, target: Option<&PlayerName>) {
        if !self.settings.review_form.enabled {
            return;
        }

        let targets = match target {
            Some(player) => vec![player.clone()],
            None => {
                let mut all = self.roster.snapshot();
                all.extend(self.spectators.iter().cloned());
                all
            }
        };

        for player in targets {
            let kills = self.kills.get(&player).copied().unwrap_or(0);
            let won = self.roster.contains(&player);
            let summary = RewardSummary::compute(&self.settings.prize, kills, won);
            let total = summary.total();
            if total == 0 {
                continue;
            }

            self.services.review.present(&player, &self.id, &summary);

            if self.rewards.contains_key(&player) {
                debug!(arena = %self.id, %player, "reward already granted this round");
                continue;
            }
            self.rewards.insert(player.clone(), total);

            match &self.services.economy {
                Some(economy) => {
                    if !economy.add_money(&player, total) {
                        warn!(arena = %self.id, %player, total, "economy rejected reward");
                    }
                }
                None => warn!(
                    arena = %self.id,
                    %player,
                    total,
                    "no economy provider installed, reward not credited"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prize() -> PrizeSettings {
        PrizeSettings {
            participation: 10,
            per_kill: 5,
            win: 50,
        }
    }

    #[test]
    fn test_compute_adds_all_parts() {
        let s = RewardSummary::compute(&prize(), 3, true);
        assert_eq!(s.kill_coins, 15);
        assert_eq!(s.win_coins, 50);
        assert_eq!(s.total(), 75);
    }

    #[test]
    fn test_compute_loser_without_kills() {
        let s = RewardSummary::compute(&prize(), 0, false);
        assert_eq!(s.total(), 10);
    }

    #[test]
    fn test_zero_prize_settings() {
        let none = PrizeSettings {
            participation: 0,
            per_kill: 0,
            win: 0,
        };
        assert_eq!(RewardSummary::compute(&none, 7, true).total(), 0);
    }

    #[test]
    fn test_describe_skips_empty_lines() {
        let text = RewardSummary::compute(&prize(), 0, false).describe();
        assert!(text.starts_with("You won 10 coins."));
        assert!(!text.contains("kills"));
        assert!(!text.contains("win ="));

        let text = RewardSummary::compute(&prize(), 2, true).describe();
        assert!(text.contains("- 2 kills = 10 coins"));
        assert!(text.contains("- 1 win = 50 coins"));
    }
}
