use serde::Serialize;

/// A clan member and their Global Map battles for one season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClanMember {
    pub name: String,
    pub id: u64,
    /// Set once battles for a season have been looked up.
    pub season_id: Option<String>,
    pub tier8_battles: u32,
    pub tier10_battles: u32,
}

impl ClanMember {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
            season_id: None,
            tier8_battles: 0,
            tier10_battles: 0,
        }
    }

    pub fn combined_battles(&self) -> u64 {
        u64::from(self.tier10_battles) + u64::from(self.tier8_battles)
    }

    pub(crate) fn record_season(&mut self, season_id: &str, battles: TierBattles) {
        self.tier8_battles = battles.tier8;
        self.tier10_battles = battles.tier10;
        self.season_id = Some(season_id.to_owned());
    }
}

/// Clan members in API response order.
pub type Roster = Vec<ClanMember>;

/// Battle counts for the two tiers the reward is based on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierBattles {
    pub tier8: u32,
    pub tier10: u32,
}
