//! Property tests for effect timers, combo routing and damage monotonicity.

use proptest::prelude::*;

use crate::action::{ActionInstanceId, ComboRouting};
use crate::combo::ComboSequencer;
use crate::damage::{DamageCalculator, DamageInput};
use crate::effects::{Effect, EffectKind, StatusEffectRegistry};
use crate::engine::Combatant;
use crate::equipment::{GearStat, Loadout, Unequipped};
use crate::stats::Attributes;

use super::helpers::{scripted_engine, spawn_combo_fighter, spawn_fighter};

fn timed_effect(kind: u8, magnitude: i32, turns: i32) -> Effect {
    match kind % 4 {
        0 => Effect::Stun { turns },
        1 => Effect::Weaken { turns },
        2 => Effect::RollPenalty {
            amount: magnitude,
            turns,
        },
        _ => Effect::EnemyRollPenalty {
            amount: magnitude,
            turns,
        },
    }
}

fn sequencer(len: usize) -> ComboSequencer {
    let mut combo = ComboSequencer::new();
    for i in 0..len {
        combo.push(ActionInstanceId::new(u32::try_from(i).unwrap()));
    }
    combo
}

fn damage(attribute: i32, roll_bonus: i32, amplification: f64, armor: i32, reduction: f64) -> u32 {
    let attacker = Loadout::new().with_bonus(GearStat::WeaponDamage, 3);
    let defender = Loadout::new().with_armor_piece(armor);
    let mut target = StatusEffectRegistry::new();
    if reduction > 0.0 {
        target
            .apply(&Effect::DamageReduction { fraction: reduction }, 0.0)
            .unwrap();
    }
    DamageCalculator::default()
        .preview(
            &DamageInput::new(attribute, &attacker)
                .with_roll_bonus(roll_bonus)
                .with_amplification(amplification),
            &target,
            &defender,
        )
        .damage
}

proptest! {
    #[test]
    fn timed_effects_clear_after_exactly_their_duration(
        kind in 0u8..4,
        magnitude in 1i32..20,
        turns in 1i32..30,
    ) {
        let effect = timed_effect(kind, magnitude, turns);
        let slot = effect.kind();
        let mut effects = StatusEffectRegistry::new();
        effects.apply(&effect, 0.0).unwrap();

        for elapsed in 1..turns {
            effects.advance_turns(1);
            let left = u32::try_from(turns - elapsed).unwrap();
            prop_assert_eq!(effects.remaining_turns(slot), Some(left));
        }
        let expired = effects.advance_turns(1);
        prop_assert_eq!(expired, vec![slot]);
        prop_assert!(!effects.is_active(slot));
    }

    #[test]
    fn negative_durations_never_change_state(kind in 0u8..4, turns in -50i32..0) {
        let mut effects = StatusEffectRegistry::new();
        effects.apply(&Effect::Shield, 0.0).unwrap();
        let before = effects.clone();
        prop_assert!(effects.apply(&timed_effect(kind, 3, turns), 0.0).is_err());
        prop_assert_eq!(effects, before);
    }

    #[test]
    fn poison_ignores_early_ticks(
        damage in 1i32..10,
        stacks in 1i32..6,
        early in 0.0f64..9.99,
    ) {
        let mut effects = StatusEffectRegistry::new();
        effects
            .apply(&Effect::Poison { damage, stacks, bleeding: false }, 0.0)
            .unwrap();

        prop_assert_eq!(effects.tick_time_based_damage(early).total(), 0);
        let due = effects.tick_time_based_damage(10.0);
        prop_assert_eq!(due.poison, u32::try_from(damage * stacks).unwrap());
        let left = effects.poison().map_or(0, |p| p.stacks);
        prop_assert_eq!(left, u32::try_from(stacks - 1).unwrap());
        prop_assert_eq!(effects.tick_time_based_damage(10.0 + early).total(), 0);
    }

    #[test]
    fn plain_routing_visits_every_slot_in_order(len in 1usize..12, laps in 1usize..4) {
        let mut combo = sequencer(len);
        let mut visited = Vec::new();
        for _ in 0..len * laps {
            visited.push(combo.step());
            combo.advance(ComboRouting::Next);
        }
        let expected: Vec<usize> = (0..laps).flat_map(|_| 0..len).collect();
        prop_assert_eq!(visited, expected);
    }

    #[test]
    fn routing_keeps_step_in_range(
        len in 1usize..10,
        routes in proptest::collection::vec(0u8..6, 1..40),
        jump in 0usize..50,
    ) {
        let mut combo = sequencer(len);
        for route in routes {
            let routing = match route {
                0 => ComboRouting::Next,
                1 => ComboRouting::JumpTo(jump),
                2 => ComboRouting::SkipNext,
                3 => ComboRouting::RepeatPrevious,
                4 => ComboRouting::LoopToStart,
                _ => ComboRouting::StopEarly,
            };
            combo.advance(routing);
            prop_assert!(combo.step() < len);
        }
    }

    #[test]
    fn fail_or_basic_always_resets(start in 0usize..5, face in 1u32..16) {
        let mut engine = scripted_engine(&[face]);
        let mut hero = spawn_combo_fighter(1, Attributes::new(5, 0, 0, 0), &["A", "B", "C", "D", "E"]);
        for _ in 0..start {
            hero.combo_mut().advance(ComboRouting::Next);
        }
        let mut foe = spawn_fighter(2, Attributes::default());

        engine.resolve_action(
            Combatant::new(&mut hero, &Unequipped),
            Combatant::new(&mut foe, &Unequipped),
        );
        prop_assert_eq!(hero.combo().step(), 0);
    }

    #[test]
    fn damage_rises_with_offense(
        attribute in -5i32..40,
        roll_bonus in -5i32..10,
        amplification in 1.0f64..2.0,
        armor in 0i32..20,
    ) {
        let base = damage(attribute, roll_bonus, amplification, armor, 0.0);
        prop_assert!(damage(attribute + 1, roll_bonus, amplification, armor, 0.0) >= base);
        prop_assert!(damage(attribute, roll_bonus + 1, amplification, armor, 0.0) >= base);
        prop_assert!(damage(attribute, roll_bonus, amplification + 0.1, armor, 0.0) >= base);
    }

    #[test]
    fn damage_falls_with_defense(
        attribute in 0i32..40,
        armor in 0i32..20,
        reduction in 0.0f64..0.9,
    ) {
        let base = damage(attribute, 0, 1.0, armor, reduction);
        prop_assert!(damage(attribute, 0, 1.0, armor + 1, reduction) <= base);
        prop_assert!(damage(attribute, 0, 1.0, armor, reduction + 0.1) <= base);
    }
}

#[test]
fn shielded_hit_is_half_then_full() {
    for incoming in [1, 2, 7, 13, 40] {
        let mut target = StatusEffectRegistry::new();
        target.apply(&Effect::Shield, 0.0).unwrap();
        let calculator = DamageCalculator::default();
        let input = DamageInput::new(incoming, &Unequipped);

        let shielded = calculator.compute(&input, &mut target, &Unequipped).damage;
        let expected = u32::try_from(incoming / 2).unwrap().max(1);
        assert_eq!(shielded, expected);
        assert!(!target.is_active(EffectKind::Shield));
        assert_eq!(
            calculator.compute(&input, &mut target, &Unequipped).damage,
            u32::try_from(incoming).unwrap()
        );
    }
}
