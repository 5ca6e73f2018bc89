use serde::Serialize;

/// Gold split for a whole roster, sorted by battles played.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardSheet {
    pub available_gold: u64,
    pub total_battles: u64,
    pub gold_per_battle: f64,
    /// Sum of the rounded rewards; may drift from `available_gold` by rounding.
    pub total_reward: u64,
    pub rows: Vec<RewardRow>,
}

/// One exported line of the reward table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardRow {
    pub name: String,
    pub tier10_battles: u32,
    pub tier8_battles: u32,
    pub combined_battles: u64,
    pub reward: u64,
}
