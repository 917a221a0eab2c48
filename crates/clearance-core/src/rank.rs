//! Rank catalog: registered rank definitions and seniority queries.

use std::collections::BTreeMap;

use contracts::{ClearanceLevel, Rank};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("rank catalog must define at least one rank")]
    Empty,
    #[error("rank {0} is defined more than once")]
    DuplicateRank(String),
}

/// Registered ranks, kept in registration order.
#[derive(Debug, Clone)]
pub struct RankCatalog {
    ranks: Vec<Rank>,
    by_name: BTreeMap<String, usize>,
}

impl RankCatalog {
    pub fn new(ranks: Vec<Rank>) -> Result<Self, CatalogError> {
        if ranks.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut by_name = BTreeMap::new();
        for (index, rank) in ranks.iter().enumerate() {
            if by_name.insert(rank.name.clone(), index).is_some() {
                return Err(CatalogError::DuplicateRank(rank.name.clone()));
            }
        }
        Ok(Self { ranks, by_name })
    }

    /// Intern → Technician → Researcher → Manager → Director.
    pub fn default_catalog() -> Self {
        let ranks = vec![
            Rank::new("Intern", "Intern", 1),
            Rank::new("Technician", "Technician", 3)
                .with_clearances([ClearanceLevel::Production]),
            Rank::new("Researcher", "Researcher", 5)
                .with_clearances([ClearanceLevel::Production, ClearanceLevel::Research]),
            Rank::new("Manager", "Manager", 7).with_clearances([
                ClearanceLevel::Production,
                ClearanceLevel::Research,
                ClearanceLevel::Command,
            ]),
            Rank::new("Director", "Director", 10).with_universal_access(),
        ];
        let by_name = ranks
            .iter()
            .enumerate()
            .map(|(index, rank)| (rank.name.clone(), index))
            .collect();
        Self { ranks, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Rank> {
        self.by_name.get(name).map(|&index| &self.ranks[index])
    }

    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    /// Lowest-seniority rank; the earliest registered wins a tie.
    pub fn entry_rank(&self) -> &Rank {
        let mut lowest = &self.ranks[0];
        for rank in &self.ranks[1..] {
            if rank.seniority < lowest.seniority {
                lowest = rank;
            }
        }
        lowest
    }

    /// Lowest rank strictly more senior than `current`, or `None` at the top.
    pub fn next_rank(&self, current: &Rank) -> Option<&Rank> {
        self.ranks
            .iter()
            .filter(|rank| rank.seniority > current.seniority)
            .fold(None, |best: Option<&Rank>, rank| match best {
                Some(best) if best.seniority <= rank.seniority => Some(best),
                _ => Some(rank),
            })
    }
}

impl Default for RankCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(RankCatalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = RankCatalog::new(vec![Rank::new("A", "A", 1), Rank::new("A", "A2", 2)])
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateRank("A".into()));
    }

    #[test]
    fn entry_rank_is_lowest_seniority() {
        let catalog = RankCatalog::new(vec![
            Rank::new("Senior", "Senior", 5),
            Rank::new("Junior", "Junior", 1),
            Rank::new("Trainee", "Trainee", 1),
        ])
        .unwrap();
        assert_eq!(catalog.entry_rank().name, "Junior");
    }

    #[test]
    fn next_rank_skips_to_closest_senior() {
        let catalog = RankCatalog::default_catalog();
        let intern = catalog.get("Intern").unwrap();
        assert_eq!(catalog.next_rank(intern).unwrap().name, "Technician");
        let director = catalog.get("Director").unwrap();
        assert!(catalog.next_rank(director).is_none());
    }

    #[test]
    fn unknown_rank_is_absent() {
        assert!(RankCatalog::default_catalog().get("Janitor").is_none());
    }
}
