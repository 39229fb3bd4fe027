//! Winner selection for collections with more than one active entity.
//!
//! The newest active entity (by `createdAt`) stays active; ties go to the
//! greatest id. An entity without a creation time counts as the oldest.
//! Planning is pure so the same input always yields the same plan; the
//! [`Coordinator`](crate::Coordinator) executes it.

use std::cmp::Ordering;

use crate::types::{Entity, EntityId};

/// Deactivations needed to restore a single active entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcilePlan {
    pub violation_found: bool,
    pub keep: Option<EntityId>,
    pub to_deactivate: Vec<EntityId>,
}

fn newer_first(a: &Entity, b: &Entity) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Pick the entity that stays active.
pub fn pick_winner<'a>(candidates: impl IntoIterator<Item = &'a Entity>) -> Option<&'a Entity> {
    candidates.into_iter().max_by(|a, b| newer_first(a, b))
}

/// Plan a sweep over a freshly listed collection.
pub fn plan<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> ReconcilePlan {
    let active: Vec<&Entity> = entities.into_iter().filter(|e| e.active).collect();

    if active.len() <= 1 {
        return ReconcilePlan {
            violation_found: false,
            keep: active.first().map(|e| e.id.clone()),
            to_deactivate: Vec::new(),
        };
    }

    let keep = pick_winner(active.iter().copied()).map(|e| e.id.clone());
    let mut to_deactivate: Vec<EntityId> = active
        .iter()
        .map(|e| e.id.clone())
        .filter(|id| Some(id) != keep.as_ref())
        .collect();
    to_deactivate.sort();

    ReconcilePlan {
        violation_found: true,
        keep,
        to_deactivate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(entity: Entity, day: u32) -> Entity {
        entity.with_created_at(Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_single_active_is_not_a_violation() {
        let entities = vec![at(Entity::new("a", true), 1), at(Entity::new("b", false), 2)];
        let plan = plan(&entities);

        assert!(!plan.violation_found);
        assert_eq!(plan.keep, Some("a".into()));
        assert!(plan.to_deactivate.is_empty());
    }

    #[test]
    fn test_none_active_is_legal() {
        let entities = vec![Entity::new("a", false)];
        assert_eq!(plan(&entities), ReconcilePlan::default());
    }

    #[test]
    fn test_newest_wins_regardless_of_order() {
        let older = at(Entity::new("a", true), 1);
        let newer = at(Entity::new("b", true), 2);

        for entities in [vec![older.clone(), newer.clone()], vec![newer, older]] {
            let plan = plan(&entities);
            assert!(plan.violation_found);
            assert_eq!(plan.keep, Some("b".into()));
            assert_eq!(plan.to_deactivate, vec![EntityId::from("a")]);
        }
    }

    #[test]
    fn test_tie_goes_to_greatest_id() {
        let entities = vec![
            at(Entity::new("m", true), 3),
            at(Entity::new("z", true), 3),
            at(Entity::new("a", true), 3),
        ];
        let plan = plan(&entities);

        assert_eq!(plan.keep, Some("z".into()));
        assert_eq!(plan.to_deactivate, vec![EntityId::from("a"), EntityId::from("m")]);
    }

    #[test]
    fn test_missing_timestamp_counts_as_oldest() {
        let entities = vec![Entity::new("undated", true), at(Entity::new("dated", true), 1)];
        let plan = plan(&entities);

        assert_eq!(plan.keep, Some("dated".into()));
        assert_eq!(plan.to_deactivate, vec![EntityId::from("undated")]);
    }
}
