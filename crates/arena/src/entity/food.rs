//! Food items and ejected fragments.

use super::block::BlockKind;
use crate::physics::BodyHandle;
use glam::Vec2;
use protocol::Color;

/// Pickup metadata carried by a fragment ejected from an organism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ejection {
    /// Organism the fragment belongs to.
    pub emitter: u32,
    /// The emitter may never pick this fragment back up.
    pub forbid_owner: bool,
    /// Nobody may pick it up before this time.
    pub pickup_locked_until: u64,
    /// Only the emitter may pick it up before this time.
    pub enemy_locked_until: u64,
}

/// A collectible square.
#[derive(Debug, Clone)]
pub struct FoodItem {
    pub id: u32,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
    pub kind: BlockKind,
    pub body: Option<BodyHandle>,
    pub collected: bool,
    pub ejection: Option<Ejection>,
    /// Spawn time; drives the presentation spin phase.
    pub born_ms: u64,
}

impl FoodItem {
    pub fn new(id: u32, position: Vec2, size: f32, color: Color, born_ms: u64) -> Self {
        Self {
            id,
            position,
            size,
            color,
            kind: BlockKind::Body,
            body: None,
            collected: false,
            ejection: None,
            born_ms,
        }
    }

    /// Whether the organism owned by `owner` may pick this item up at `now`.
    pub fn can_be_collected_by(&self, owner: u32, now: u64) -> bool {
        if self.collected {
            return false;
        }
        let Some(ejection) = &self.ejection else {
            return true;
        };
        if now < ejection.pickup_locked_until {
            return false;
        }
        if ejection.forbid_owner && owner == ejection.emitter {
            return false;
        }
        !(now < ejection.enemy_locked_until && owner != ejection.emitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(forbid_owner: bool) -> FoodItem {
        let mut item = FoodItem::new(1, Vec2::ZERO, 20.0, Color::default(), 0);
        item.ejection = Some(Ejection {
            emitter: 7,
            forbid_owner,
            pickup_locked_until: 300,
            enemy_locked_until: 1500,
        });
        item
    }

    #[test]
    fn test_plain_food_is_collectible_until_collected() {
        let mut item = FoodItem::new(1, Vec2::ZERO, 10.0, Color::default(), 0);
        assert!(item.can_be_collected_by(3, 0));
        item.collected = true;
        assert!(!item.can_be_collected_by(3, 0));
    }

    #[test]
    fn test_universal_lock_blocks_everyone() {
        let item = fragment(false);
        assert!(!item.can_be_collected_by(7, 299));
        assert!(!item.can_be_collected_by(8, 299));
    }

    #[test]
    fn test_enemy_lock_admits_only_emitter() {
        let item = fragment(false);
        assert!(item.can_be_collected_by(7, 300));
        assert!(!item.can_be_collected_by(8, 1499));
        assert!(item.can_be_collected_by(8, 1500));
    }

    #[test]
    fn test_forbid_owner_is_permanent() {
        let item = fragment(true);
        assert!(!item.can_be_collected_by(7, 300));
        assert!(!item.can_be_collected_by(7, 1_000_000));
        assert!(item.can_be_collected_by(8, 1500));
    }
}
