//! Condition evaluation against a read-only state snapshot.
//!
//! The evaluator is the leaf dependency of the whole engine: routine
//! traversal, candidate gating, and feasibility all funnel through it.
//! Evaluation is pure except for [`Condition::RandomChance`], which draws
//! from the caller's seeded random source so outcomes replay under a
//! fixed seed.
//!
//! Custom conditions are an open extension point: hosts register a
//! handler per string id. An unregistered id evaluates to `false` (fail
//! closed) and logs the miss -- a typo in config degrades one branch, it
//! never takes the engine down.

use std::collections::BTreeMap;

use rand::Rng;
use rust_decimal::Decimal;
use tracing::warn;

use cadence_types::{Condition, FlagKey, MoodState, NpcId, TimeOfDay};

use crate::stores::RelationshipStore;

/// Granularity of the random-chance roll (basis points).
const CHANCE_SCALE: u32 = 10_000;

/// Read-only snapshot a condition is evaluated against.
///
/// Assembled per NPC per evaluation by the resolver; everything in here
/// is borrowed from session state or world context.
pub struct ConditionContext<'a> {
    /// The NPC the condition concerns.
    pub npc_id: NpcId,
    /// The NPC's current energy.
    pub energy: Decimal,
    /// The NPC's current mood snapshot.
    pub mood: &'a MoodState,
    /// Session flags.
    pub flags: &'a BTreeMap<FlagKey, serde_json::Value>,
    /// Current time-of-day bucket.
    pub time_of_day: TimeOfDay,
    /// Relationship metric access.
    pub relationships: &'a dyn RelationshipStore,
    /// This NPC's role bindings (role string -> NPC).
    pub role_bindings: &'a BTreeMap<String, NpcId>,
}

impl ConditionContext<'_> {
    /// Resolve a companion reference to a concrete NPC, if possible.
    pub fn resolve_companion(&self, target: &cadence_types::CompanionRef) -> Option<NpcId> {
        match target {
            cadence_types::CompanionRef::Npc(id) => Some(*id),
            cadence_types::CompanionRef::Role(role) => {
                let resolved = self.role_bindings.get(role).copied();
                if resolved.is_none() {
                    warn!(npc = %self.npc_id, role, "unresolvable companion role");
                }
                resolved
            }
        }
    }
}

/// A host-registered condition handler.
///
/// Handlers must be pure: same params + context, same answer. Hosts that
/// need randomness should model it as a [`Condition::RandomChance`]
/// wrapped around the custom condition instead.
pub trait CustomCondition: Send + Sync {
    /// Evaluate the condition.
    fn evaluate(
        &self,
        params: &BTreeMap<String, serde_json::Value>,
        ctx: &ConditionContext<'_>,
    ) -> bool;
}

impl<F> CustomCondition for F
where
    F: Fn(&BTreeMap<String, serde_json::Value>, &ConditionContext<'_>) -> bool + Send + Sync,
{
    fn evaluate(
        &self,
        params: &BTreeMap<String, serde_json::Value>,
        ctx: &ConditionContext<'_>,
    ) -> bool {
        self(params, ctx)
    }
}

/// Evaluates declarative conditions, dispatching custom ids to
/// registered handlers.
#[derive(Default)]
pub struct ConditionEvaluator {
    handlers: BTreeMap<String, Box<dyn CustomCondition>>,
}

impl ConditionEvaluator {
    /// Create an evaluator with no custom handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a custom condition id, replacing any
    /// previous handler under the same id.
    pub fn register(&mut self, id: impl Into<String>, handler: impl CustomCondition + 'static) {
        self.handlers.insert(id.into(), Box::new(handler));
    }

    /// Evaluate one condition.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        condition: &Condition,
        ctx: &ConditionContext<'_>,
        rng: &mut R,
    ) -> bool {
        match condition {
            Condition::RelationshipThreshold {
                target,
                metric,
                min,
                max,
            } => {
                let Some(target_id) = ctx.resolve_companion(target) else {
                    return false;
                };
                let value = ctx.relationships.metric(ctx.npc_id, target_id, *metric);
                min.is_none_or(|lo| value >= lo) && max.is_none_or(|hi| value <= hi)
            }

            Condition::FlagEquals { flag, value } => {
                ctx.flags.get(flag).unwrap_or(&serde_json::Value::Null) == value
            }

            Condition::MoodTagIn { any_of } => {
                any_of.iter().any(|tag| ctx.mood.tags.contains(tag))
            }

            Condition::EnergyRange { min, max } => {
                min.is_none_or(|lo| ctx.energy >= lo) && max.is_none_or(|hi| ctx.energy <= hi)
            }

            Condition::RandomChance { probability } => {
                let clamped = (*probability).clamp(Decimal::ZERO, Decimal::ONE);
                let threshold = clamped.saturating_mul(Decimal::from(CHANCE_SCALE));
                let roll: u32 = rng.random_range(0..CHANCE_SCALE);
                Decimal::from(roll) < threshold
            }

            Condition::TimeOfDayIn { any_of } => any_of.contains(&ctx.time_of_day),

            Condition::Custom { id, params } => self.handlers.get(id).map_or_else(
                || {
                    warn!(condition_id = id, "no handler registered for custom condition");
                    false
                },
                |handler| handler.evaluate(params, ctx),
            ),
        }
    }

    /// Evaluate a conjunction: true only if every condition passes.
    ///
    /// An empty slice passes -- conditions are restrictions, and stating
    /// none restricts nothing.
    pub fn evaluate_all<R: Rng + ?Sized>(
        &self,
        conditions: &[Condition],
        ctx: &ConditionContext<'_>,
        rng: &mut R,
    ) -> bool {
        conditions.iter().all(|c| self.evaluate(c, ctx, rng))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use cadence_types::{CompanionRef, MoodTag, RelationshipMetric};

    use crate::stores::InMemoryRelationshipStore;

    use super::*;

    struct Fixture {
        npc: NpcId,
        other: NpcId,
        mood: MoodState,
        flags: BTreeMap<FlagKey, serde_json::Value>,
        roles: BTreeMap<String, NpcId>,
        relationships: InMemoryRelationshipStore,
    }

    impl Fixture {
        fn new() -> Self {
            let npc = NpcId::new();
            let other = NpcId::new();
            let mut roles = BTreeMap::new();
            roles.insert(String::from("role:friend"), other);
            Self {
                npc,
                other,
                mood: MoodState::default(),
                flags: BTreeMap::new(),
                roles,
                relationships: InMemoryRelationshipStore::new(),
            }
        }

        fn ctx(&self) -> ConditionContext<'_> {
            ConditionContext {
                npc_id: self.npc,
                energy: Decimal::from(50),
                mood: &self.mood,
                flags: &self.flags,
                time_of_day: TimeOfDay::Morning,
                relationships: &self.relationships,
                role_bindings: &self.roles,
            }
        }
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn energy_range_bounds_inclusive() {
        let fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();
        let cond = Condition::EnergyRange {
            min: Some(Decimal::from(50)),
            max: Some(Decimal::from(50)),
        };
        assert!(evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));

        let cond = Condition::EnergyRange {
            min: Some(Decimal::from(51)),
            max: None,
        };
        assert!(!evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));
    }

    #[test]
    fn relationship_threshold_via_role() {
        let fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();

        // Neutral store: affinity is 50.
        let cond = Condition::RelationshipThreshold {
            target: CompanionRef::Role(String::from("role:friend")),
            metric: RelationshipMetric::Affinity,
            min: Some(Decimal::from(40)),
            max: None,
        };
        assert!(evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));

        let cond = Condition::RelationshipThreshold {
            target: CompanionRef::Role(String::from("role:friend")),
            metric: RelationshipMetric::Affinity,
            min: Some(Decimal::from(60)),
            max: None,
        };
        assert!(!evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));
    }

    #[test]
    fn unresolvable_role_fails_closed() {
        let fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();
        let cond = Condition::RelationshipThreshold {
            target: CompanionRef::Role(String::from("role:nemesis")),
            metric: RelationshipMetric::Tension,
            min: None,
            max: None,
        };
        assert!(!evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));
    }

    #[test]
    fn flag_equals_matches_unset_as_null() {
        let mut fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();

        let unset = Condition::FlagEquals {
            flag: FlagKey::from("flag:met_player"),
            value: serde_json::Value::Null,
        };
        assert!(evaluator.evaluate(&unset, &fixture.ctx(), &mut rng()));

        fixture.flags.insert(
            FlagKey::from("flag:met_player"),
            serde_json::Value::Bool(true),
        );
        assert!(!evaluator.evaluate(&unset, &fixture.ctx(), &mut rng()));

        let set = Condition::FlagEquals {
            flag: FlagKey::from("flag:met_player"),
            value: serde_json::Value::Bool(true),
        };
        assert!(evaluator.evaluate(&set, &fixture.ctx(), &mut rng()));
    }

    #[test]
    fn mood_tag_any_of() {
        let mut fixture = Fixture::new();
        fixture.mood.tags.insert(MoodTag::Tired);
        let evaluator = ConditionEvaluator::new();

        let cond = Condition::MoodTagIn {
            any_of: vec![MoodTag::Cheerful, MoodTag::Tired],
        };
        assert!(evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));

        let cond = Condition::MoodTagIn {
            any_of: vec![MoodTag::Cheerful],
        };
        assert!(!evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));
    }

    #[test]
    fn random_chance_extremes() {
        let fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();

        let never = Condition::RandomChance {
            probability: Decimal::ZERO,
        };
        let always = Condition::RandomChance {
            probability: Decimal::ONE,
        };
        let mut r = rng();
        for _ in 0..100 {
            assert!(!evaluator.evaluate(&never, &fixture.ctx(), &mut r));
            assert!(evaluator.evaluate(&always, &fixture.ctx(), &mut r));
        }
    }

    #[test]
    fn random_chance_is_reproducible() {
        let fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();
        let cond = Condition::RandomChance {
            probability: Decimal::new(5, 1),
        };

        let run = |seed: u64| -> Vec<bool> {
            let mut r = SmallRng::seed_from_u64(seed);
            (0..32)
                .map(|_| evaluator.evaluate(&cond, &fixture.ctx(), &mut r))
                .collect()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn unknown_custom_condition_fails_closed() {
        let fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();
        let cond = Condition::Custom {
            id: String::from("weather_is"),
            params: BTreeMap::new(),
        };
        assert!(!evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));
    }

    #[test]
    fn registered_custom_condition_runs() {
        let fixture = Fixture::new();
        let mut evaluator = ConditionEvaluator::new();
        evaluator.register(
            "weather_is",
            |params: &BTreeMap<String, serde_json::Value>, _ctx: &ConditionContext<'_>| {
                params.get("weather").and_then(|v| v.as_str()) == Some("rain")
            },
        );

        let mut params = BTreeMap::new();
        params.insert(String::from("weather"), serde_json::json!("rain"));
        let cond = Condition::Custom {
            id: String::from("weather_is"),
            params,
        };
        assert!(evaluator.evaluate(&cond, &fixture.ctx(), &mut rng()));
    }

    #[test]
    fn empty_conjunction_passes() {
        let fixture = Fixture::new();
        let evaluator = ConditionEvaluator::new();
        assert!(evaluator.evaluate_all(&[], &fixture.ctx(), &mut rng()));
    }
}
