use std::cmp::Reverse;

use tracing::debug;

use crate::error::RewardError;
use crate::model::{ClanMember, RewardRow, RewardSheet};

/// Sort members by tier 10 + tier 8 battles, most first. Ties keep their order.
pub fn sort_by_battles(roster: &mut [ClanMember]) {
    roster.sort_by_key(|m| Reverse(m.combined_battles()));
}

/// Split `available_gold` over the roster proportionally to combined battles.
///
/// Each reward is `round(combined * available_gold / total_battles)`, rounded
/// half away from zero, so the rewards may not add up to exactly
/// `available_gold`.
///
/// # Examples
///
/// ```
/// use goldtool::{compute_rewards, ClanMember};
///
/// let mut alpha = ClanMember::new("Alpha", 1);
/// alpha.tier10_battles = 30;
/// let mut bravo = ClanMember::new("Bravo", 2);
/// bravo.tier8_battles = 10;
///
/// let sheet = compute_rewards(&[bravo, alpha], 1000).unwrap();
/// assert_eq!(sheet.rows[0].name, "Alpha");
/// assert_eq!(sheet.rows[0].reward, 750);
/// assert_eq!(sheet.rows[1].reward, 250);
/// ```
pub fn compute_rewards(
    roster: &[ClanMember],
    available_gold: u64,
) -> Result<RewardSheet, RewardError> {
    if roster.is_empty() {
        return Err(RewardError::EmptyRoster);
    }

    let total_battles: u64 = roster.iter().map(ClanMember::combined_battles).sum();
    if total_battles == 0 {
        return Err(RewardError::NoBattles {
            members: roster.len(),
        });
    }

    let mut sorted = roster.to_vec();
    sort_by_battles(&mut sorted);

    let gold_per_battle = available_gold as f64 / total_battles as f64;
    let rows: Vec<RewardRow> = sorted
        .into_iter()
        .map(|member| {
            let combined_battles = member.combined_battles();
            RewardRow {
                reward: (combined_battles as f64 * gold_per_battle).round() as u64,
                combined_battles,
                tier10_battles: member.tier10_battles,
                tier8_battles: member.tier8_battles,
                name: member.name,
            }
        })
        .collect();
    let total_reward: u64 = rows.iter().map(|r| r.reward).sum();

    debug!(
        members = rows.len(),
        total_battles, gold_per_battle, total_reward, "computed rewards"
    );

    Ok(RewardSheet {
        available_gold,
        total_battles,
        gold_per_battle,
        total_reward,
        rows,
    })
}
