//! Candidate scoring: eight independent multiplicative factors.
//!
//! Every feasible candidate receives a score built from eight factors,
//! each clamped to the configured `[factor_floor, factor_ceiling]` band
//! before multiplication so that one weak factor dampens but never zeroes
//! a candidate, and one strong factor boosts but never dominates. The
//! final product is clamped to `[product_floor, product_ceiling]`.
//!
//! The factors, in order:
//!
//! 1. **Base weight** -- the candidate's weight on its routine node.
//! 2. **Activity preference** -- the NPC's per-activity weight.
//! 3. **Category preference** -- the NPC's per-category weight.
//! 4. **Personality** -- trait/category compatibility plus chronotype.
//! 5. **Mood** -- valence/arousal alignment plus tag nudges.
//! 6. **Relationship** -- metrics toward required companions.
//! 7. **Urgency** -- restorative boost as energy approaches zero.
//! 8. **Continuity** -- mild bonus for the already-running activity.
//!
//! Exclusion is distinct from dampening: an *explicit* activity or
//! category preference weight of zero (or below), or a zero base weight,
//! removes the candidate from the pool entirely -- clamping would
//! otherwise resurrect it at the factor floor. [`score_candidate`]
//! returns `None` for excluded candidates.

use rust_decimal::Decimal;

use cadence_types::{
    Activity, ActivityCategory, MoodTag, NpcId, NpcPreferences, NpcSessionState,
    RelationshipMetric, TimeOfDay,
};

use crate::config::ScoringConfig;
use crate::stores::RelationshipStore;

/// Everything the scorer needs to judge one candidate.
pub struct ScoreContext<'a> {
    /// The NPC being scored for.
    pub npc_id: NpcId,
    /// The candidate activity.
    pub activity: &'a Activity,
    /// The candidate's base weight on the routine node.
    pub base_weight: Decimal,
    /// The NPC's effective preferences.
    pub preferences: &'a NpcPreferences,
    /// The NPC's session state (energy, mood, running activity).
    pub state: &'a NpcSessionState,
    /// Current time-of-day bucket.
    pub time_of_day: TimeOfDay,
    /// Required companions, already resolved to concrete NPCs.
    pub companions: &'a [NpcId],
    /// Relationship metric access.
    pub relationships: &'a dyn RelationshipStore,
}

/// Per-factor breakdown of one candidate's score.
///
/// Factors are stored post-clamp; `total` is the clamped product. Kept
/// around (not just the total) so hosts can log *why* an NPC chose what
/// it chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Base candidate weight.
    pub base: Decimal,
    /// Per-activity preference factor.
    pub activity_preference: Decimal,
    /// Per-category preference factor.
    pub category_preference: Decimal,
    /// Personality/chronotype compatibility factor.
    pub personality: Decimal,
    /// Mood compatibility factor.
    pub mood: Decimal,
    /// Relationship compatibility factor.
    pub relationship: Decimal,
    /// Urgency factor.
    pub urgency: Decimal,
    /// Continuity factor.
    pub continuity: Decimal,
    /// The clamped product of all eight factors.
    pub total: Decimal,
}

/// Score one candidate, or exclude it.
///
/// Returns `None` when the candidate is hard-excluded: its base weight
/// or an explicit preference weight is zero or negative.
pub fn score_candidate(config: &ScoringConfig, ctx: &ScoreContext<'_>) -> Option<ScoreBreakdown> {
    if ctx.base_weight <= Decimal::ZERO {
        return None;
    }

    let activity_preference = match ctx.preferences.activity_weights.get(&ctx.activity.id) {
        Some(weight) if *weight <= Decimal::ZERO => return None,
        Some(weight) => *weight,
        None => Decimal::ONE,
    };
    let category_preference = match ctx.preferences.category_weights.get(&ctx.activity.category) {
        Some(weight) if *weight <= Decimal::ZERO => return None,
        Some(weight) => *weight,
        None => Decimal::ONE,
    };

    let clamp = |factor: Decimal| factor.clamp(config.factor_floor, config.factor_ceiling);

    let base = clamp(ctx.base_weight);
    let activity_preference = clamp(activity_preference);
    let category_preference = clamp(category_preference);
    let personality = clamp(personality_factor(ctx));
    let mood = clamp(mood_factor(ctx));
    let relationship = clamp(relationship_factor(ctx));
    let urgency = clamp(urgency_factor(config, ctx));
    let continuity = clamp(continuity_factor(config, ctx));

    let product = [
        activity_preference,
        category_preference,
        personality,
        mood,
        relationship,
        urgency,
        continuity,
    ]
    .iter()
    .fold(base, |acc, factor| acc.saturating_mul(*factor));

    Some(ScoreBreakdown {
        base,
        activity_preference,
        category_preference,
        personality,
        mood,
        relationship,
        urgency,
        continuity,
        total: product.clamp(config.product_floor, config.product_ceiling),
    })
}

// ---------------------------------------------------------------------------
// Individual factors (pre-clamp values)
// ---------------------------------------------------------------------------

/// 0.25, the slope of the mood axes and the chronotype boost margin.
fn quarter() -> Decimal {
    Decimal::new(25, 2)
}

/// 0.5, the neutral trait midpoint and the factor offset.
fn half() -> Decimal {
    Decimal::new(5, 1)
}

/// Personality compatibility: `0.5 + trait` for the category-matched
/// trait (neutral 0.5 yields 1.0), then chronotype adjustment at the
/// edges of the day.
fn personality_factor(ctx: &ScoreContext<'_>) -> Decimal {
    let traits = ctx.preferences.personality;
    let matched_trait = match ctx.activity.category {
        ActivityCategory::Social => traits.extraversion,
        ActivityCategory::Work | ActivityCategory::Routine => traits.conscientiousness,
        ActivityCategory::Leisure | ActivityCategory::Quest => traits.openness,
    };
    let mut factor = half().saturating_add(matched_trait);

    let bias = ctx.preferences.time_bias;
    let boost = Decimal::ONE.saturating_add(quarter());
    let damp = Decimal::new(8, 1);
    match ctx.time_of_day {
        TimeOfDay::Dawn if bias.early_riser => factor = factor.saturating_mul(boost),
        TimeOfDay::Dawn if bias.night_owl => factor = factor.saturating_mul(damp),
        TimeOfDay::Night if bias.night_owl => factor = factor.saturating_mul(boost),
        TimeOfDay::Night if bias.early_riser => factor = factor.saturating_mul(damp),
        _ => {}
    }
    factor
}

/// Mood compatibility: positive valence lifts everything; arousal aligns
/// with the activity's tempo (high arousal favors active categories,
/// low arousal favors restful ones). Discrete tags nudge on top.
fn mood_factor(ctx: &ScoreContext<'_>) -> Decimal {
    let mood = &ctx.state.mood;
    let active = matches!(
        ctx.activity.category,
        ActivityCategory::Work | ActivityCategory::Social | ActivityCategory::Quest
    );

    let arousal_alignment = if active {
        mood.arousal
    } else {
        Decimal::ZERO.saturating_sub(mood.arousal)
    };
    let mut factor = Decimal::ONE
        .saturating_add(mood.valence.saturating_mul(quarter()))
        .saturating_add(arousal_alignment.saturating_mul(quarter()));

    let nudge = |factor: Decimal, up: bool| {
        if up {
            factor.saturating_mul(Decimal::new(12, 1))
        } else {
            factor.saturating_mul(Decimal::new(8, 1))
        }
    };
    if mood.tags.contains(&MoodTag::Tired) {
        factor = nudge(factor, !active);
    }
    if mood.tags.contains(&MoodTag::Energetic) && active {
        factor = nudge(factor, true);
    }
    if ctx.activity.category == ActivityCategory::Social {
        if mood.tags.contains(&MoodTag::Irritable) {
            factor = factor.saturating_mul(Decimal::new(7, 1));
        }
        if mood.tags.contains(&MoodTag::Cheerful) {
            factor = nudge(factor, true);
        }
    }
    factor
}

/// Relationship compatibility toward required companions.
///
/// Neutral metrics (all 50) yield exactly 1. Affinity pulls hardest,
/// chemistry half as hard, tension pushes down. Preferred companions
/// boost the per-companion factor, avoided companions dampen it. With
/// multiple companions the factors are averaged.
fn relationship_factor(ctx: &ScoreContext<'_>) -> Decimal {
    if ctx.companions.is_empty() {
        return Decimal::ONE;
    }

    let neutral = Decimal::from(50);
    let hundred = Decimal::ONE_HUNDRED;
    let two_hundred = Decimal::from(200);

    let mut sum = Decimal::ZERO;
    for companion in ctx.companions {
        let affinity = ctx
            .relationships
            .metric(ctx.npc_id, *companion, RelationshipMetric::Affinity);
        let chemistry = ctx
            .relationships
            .metric(ctx.npc_id, *companion, RelationshipMetric::Chemistry);
        let tension = ctx
            .relationships
            .metric(ctx.npc_id, *companion, RelationshipMetric::Tension);

        let mut factor = Decimal::ONE
            .saturating_add(
                affinity
                    .saturating_sub(neutral)
                    .checked_div(hundred)
                    .unwrap_or(Decimal::ZERO),
            )
            .saturating_add(
                chemistry
                    .saturating_sub(neutral)
                    .checked_div(two_hundred)
                    .unwrap_or(Decimal::ZERO),
            )
            .saturating_sub(
                tension
                    .saturating_sub(neutral)
                    .checked_div(two_hundred)
                    .unwrap_or(Decimal::ZERO),
            );

        if ctx.preferences.preferred_companions.contains(companion) {
            factor = factor.saturating_mul(Decimal::ONE.saturating_add(quarter()));
        }
        if ctx.preferences.avoided_companions.contains(companion) {
            factor = factor.saturating_mul(Decimal::new(6, 1));
        }
        sum = sum.saturating_add(factor);
    }

    let count = u64::try_from(ctx.companions.len()).unwrap_or(1);
    sum.checked_div(Decimal::from(count)).unwrap_or(Decimal::ONE)
}

/// Urgency: as energy falls below the configured threshold, restorative
/// activities (positive energy rate) gain up to a doubling, draining
/// ones lose up to half.
fn urgency_factor(config: &ScoringConfig, ctx: &ScoreContext<'_>) -> Decimal {
    let threshold = config.urgency_energy_threshold;
    if threshold <= Decimal::ZERO || ctx.state.energy >= threshold {
        return Decimal::ONE;
    }

    let deficit = threshold
        .saturating_sub(ctx.state.energy)
        .checked_div(threshold)
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, Decimal::ONE);

    let rate = ctx.activity.effects.energy_per_hour;
    if rate > Decimal::ZERO {
        Decimal::ONE.saturating_add(deficit)
    } else if rate < Decimal::ZERO {
        Decimal::ONE.saturating_sub(deficit.checked_div(Decimal::from(2)).unwrap_or(Decimal::ZERO))
    } else {
        Decimal::ONE
    }
}

/// Continuity: the running activity gets the configured bonus so NPCs do
/// not thrash between near-equal candidates. Never overrides the
/// `min_duration` gate or cooldowns -- those exclude before scoring runs.
fn continuity_factor(config: &ScoringConfig, ctx: &ScoreContext<'_>) -> Decimal {
    if ctx.state.current_activity.as_ref() == Some(&ctx.activity.id) {
        config.continuity_bonus
    } else {
        Decimal::ONE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cadence_types::{ActivityEffects, ActivityId, PersonalityTraits, TimeBias};

    use crate::stores::InMemoryRelationshipStore;

    use super::*;

    fn activity(id: &str, category: ActivityCategory, energy_per_hour: i64) -> Activity {
        Activity {
            id: ActivityId::from(id),
            display_name: id.to_owned(),
            category,
            requirements: None,
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(energy_per_hour),
                ..ActivityEffects::default()
            },
            min_duration_secs: 600,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        }
    }

    struct Fixture {
        npc: NpcId,
        preferences: NpcPreferences,
        state: NpcSessionState,
        relationships: InMemoryRelationshipStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                npc: NpcId::new(),
                preferences: NpcPreferences::default(),
                state: NpcSessionState::new(0),
                relationships: InMemoryRelationshipStore::new(),
            }
        }

        fn score(&self, activity: &Activity, companions: &[NpcId]) -> Option<ScoreBreakdown> {
            let config = ScoringConfig::default();
            score_candidate(
                &config,
                &ScoreContext {
                    npc_id: self.npc,
                    activity,
                    base_weight: Decimal::ONE,
                    preferences: &self.preferences,
                    state: &self.state,
                    time_of_day: TimeOfDay::Morning,
                    companions,
                    relationships: &self.relationships,
                },
            )
        }
    }

    #[test]
    fn neutral_inputs_score_near_one() {
        let fixture = Fixture::new();
        let work = activity("activity:work", ActivityCategory::Work, -5);
        let breakdown = fixture.score(&work, &[]).unwrap();
        assert_eq!(breakdown.personality, Decimal::ONE);
        assert_eq!(breakdown.relationship, Decimal::ONE);
        assert_eq!(breakdown.urgency, Decimal::ONE);
        assert_eq!(breakdown.continuity, Decimal::ONE);
        assert_eq!(breakdown.total, Decimal::ONE);
    }

    #[test]
    fn explicit_zero_activity_weight_excludes() {
        let mut fixture = Fixture::new();
        fixture
            .preferences
            .activity_weights
            .insert(ActivityId::from("activity:work"), Decimal::ZERO);
        let work = activity("activity:work", ActivityCategory::Work, -5);
        assert!(fixture.score(&work, &[]).is_none());
    }

    #[test]
    fn explicit_zero_category_weight_excludes() {
        let mut fixture = Fixture::new();
        fixture
            .preferences
            .category_weights
            .insert(ActivityCategory::Social, Decimal::ZERO);
        let chat = activity("activity:chat", ActivityCategory::Social, -2);
        assert!(fixture.score(&chat, &[]).is_none());
    }

    #[test]
    fn missing_weight_defaults_to_one_not_excluded() {
        let fixture = Fixture::new();
        let work = activity("activity:work", ActivityCategory::Work, -5);
        let breakdown = fixture.score(&work, &[]).unwrap();
        assert_eq!(breakdown.activity_preference, Decimal::ONE);
        assert_eq!(breakdown.category_preference, Decimal::ONE);
    }

    #[test]
    fn factors_are_clamped_to_configured_band() {
        let mut fixture = Fixture::new();
        fixture
            .preferences
            .activity_weights
            .insert(ActivityId::from("activity:work"), Decimal::from(50));
        let work = activity("activity:work", ActivityCategory::Work, -5);
        let breakdown = fixture.score(&work, &[]).unwrap();
        // Default ceiling is 2.0.
        assert_eq!(breakdown.activity_preference, Decimal::from(2));
    }

    #[test]
    fn low_energy_boosts_restorative_and_dampens_draining() {
        let mut fixture = Fixture::new();
        fixture.state.energy = Decimal::from(5);

        let sleep = activity("activity:sleep", ActivityCategory::Routine, 12);
        let work = activity("activity:work", ActivityCategory::Work, -5);

        let sleep_urgency = fixture.score(&sleep, &[]).unwrap().urgency;
        let work_urgency = fixture.score(&work, &[]).unwrap().urgency;

        assert!(sleep_urgency > Decimal::ONE, "restorative should be boosted");
        assert!(work_urgency < Decimal::ONE, "draining should be dampened");
    }

    #[test]
    fn personality_raises_matched_category() {
        let mut fixture = Fixture::new();
        fixture.preferences.personality = PersonalityTraits {
            extraversion: Decimal::new(9, 1),
            conscientiousness: Decimal::new(1, 1),
            openness: Decimal::new(5, 1),
        };
        let chat = activity("activity:chat", ActivityCategory::Social, -2);
        let work = activity("activity:work", ActivityCategory::Work, -5);

        let chat_factor = fixture.score(&chat, &[]).unwrap().personality;
        let work_factor = fixture.score(&work, &[]).unwrap().personality;
        assert!(chat_factor > work_factor);
        // 0.5 + 0.9 = 1.4 and 0.5 + 0.1 = 0.6.
        assert_eq!(chat_factor, Decimal::new(14, 1));
        assert_eq!(work_factor, Decimal::new(6, 1));
    }

    #[test]
    fn night_owl_bias_shifts_night_scores() {
        let mut fixture = Fixture::new();
        fixture.preferences.time_bias = TimeBias {
            early_riser: false,
            night_owl: true,
        };
        let read = activity("activity:read", ActivityCategory::Leisure, 2);
        let config = ScoringConfig::default();
        let score_at = |tod: TimeOfDay| {
            score_candidate(
                &config,
                &ScoreContext {
                    npc_id: fixture.npc,
                    activity: &read,
                    base_weight: Decimal::ONE,
                    preferences: &fixture.preferences,
                    state: &fixture.state,
                    time_of_day: tod,
                    companions: &[],
                    relationships: &fixture.relationships,
                },
            )
            .unwrap()
            .personality
        };
        assert!(score_at(TimeOfDay::Night) > score_at(TimeOfDay::Afternoon));
        assert!(score_at(TimeOfDay::Dawn) < score_at(TimeOfDay::Afternoon));
    }

    #[test]
    fn relationship_metrics_move_the_factor() {
        let fixture = Fixture::new();
        let friend = NpcId::new();
        let rival = NpcId::new();
        fixture.relationships.seed(
            fixture.npc,
            friend,
            Decimal::from(90),
            Decimal::from(70),
            Decimal::from(60),
            Decimal::from(10),
        );
        fixture.relationships.seed(
            fixture.npc,
            rival,
            Decimal::from(10),
            Decimal::from(20),
            Decimal::from(30),
            Decimal::from(95),
        );

        let visit = activity("activity:visit", ActivityCategory::Social, -2);
        let with_friend = fixture.score(&visit, &[friend]).unwrap().relationship;
        let with_rival = fixture.score(&visit, &[rival]).unwrap().relationship;
        assert!(with_friend > Decimal::ONE);
        assert!(with_rival < Decimal::ONE);
    }

    #[test]
    fn continuity_bonus_applies_to_running_activity() {
        let mut fixture = Fixture::new();
        fixture.state.current_activity = Some(ActivityId::from("activity:work"));
        let work = activity("activity:work", ActivityCategory::Work, -5);
        let breakdown = fixture.score(&work, &[]).unwrap();
        assert_eq!(breakdown.continuity, Decimal::new(115, 2));
    }

    #[test]
    fn tired_mood_dampens_active_categories() {
        let mut fixture = Fixture::new();
        fixture.state.mood.tags.insert(MoodTag::Tired);
        let work = activity("activity:work", ActivityCategory::Work, -5);
        let nap = activity("activity:nap", ActivityCategory::Routine, 10);
        let work_mood = fixture.score(&work, &[]).unwrap().mood;
        let nap_mood = fixture.score(&nap, &[]).unwrap().mood;
        assert!(work_mood < nap_mood);
    }
}
