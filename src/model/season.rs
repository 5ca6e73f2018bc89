use serde::Serialize;

/// A Global Map season or campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Season {
    pub name: String,
    pub id: String,
}

/// All seasons known to the backend, in response order.
///
/// Resolves a user-facing selection to a [`Season`]. Passed around as a value
/// instead of being cached anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeasonCatalog {
    seasons: Vec<Season>,
}

impl SeasonCatalog {
    pub fn new(seasons: Vec<Season>) -> Self {
        Self { seasons }
    }

    /// Look up a season by exact name, falling back to an exact id match.
    pub fn resolve(&self, selection: &str) -> Option<&Season> {
        self.seasons
            .iter()
            .find(|s| s.name == selection)
            .or_else(|| self.seasons.iter().find(|s| s.id == selection))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Season> {
        self.seasons.iter()
    }

    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }
}

impl From<Vec<Season>> for SeasonCatalog {
    fn from(seasons: Vec<Season>) -> Self {
        Self::new(seasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(name: &str, id: &str) -> Season {
        Season {
            name: name.to_owned(),
            id: id.to_owned(),
        }
    }

    #[test]
    fn test_resolve_prefers_name_over_id() {
        let catalog = SeasonCatalog::new(vec![
            season("Season 1", "season_1"),
            season("season_1", "season_x"),
        ]);

        assert_eq!(catalog.resolve("season_1").unwrap().id, "season_x");
        assert_eq!(catalog.resolve("Season 1").unwrap().id, "season_1");
        assert_eq!(catalog.resolve("season_x").unwrap().name, "season_1");
        assert!(catalog.resolve("season 1").is_none());
    }

    #[test]
    fn test_catalog_keeps_response_order() {
        let catalog = SeasonCatalog::from(vec![season("B", "b"), season("A", "a")]);

        assert_eq!(catalog.len(), 2);
        let ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert!(SeasonCatalog::default().is_empty());
    }
}
