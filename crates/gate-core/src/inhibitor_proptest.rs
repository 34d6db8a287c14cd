#[cfg(test)]
mod proptest_inhibitor {
    use crate::config::InhibitorConfig;
    use crate::inhibitor::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Feed {
        Fine(RoundDuration),
        Coarse,
    }

    fn feed() -> impl Strategy<Value = Feed> {
        prop_oneof![
            (0u64..=2_000_000).prop_map(Feed::Fine),
            Just(Feed::Coarse),
        ]
    }

    /// Inhibitor whose power-up window has drained, settled on `duration`.
    fn settled_on(duration: RoundDuration) -> Inhibitor {
        let mut inhibitor = Inhibitor::default();
        inhibitor.feed_fine(duration);
        inhibitor.feed_coarse(duration);
        inhibitor.feed_coarse(duration);
        inhibitor
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Property: a turntable at constant speed is never inhibited
        #[test]
        fn constant_speed_never_inhibits(
            duration in 1u64..=10_000_000,
            rounds in 1usize..200,
        ) {
            let mut inhibitor = settled_on(duration);
            for _ in 0..rounds {
                inhibitor.feed_fine(duration);
                prop_assert!(!inhibitor.is_inhibited());
            }
        }

        // Property: a change above threshold inhibits for exactly two coarse rounds
        #[test]
        fn disturbance_holds_exactly_two_rounds(
            d1 in 1u64..=1_000_000,
            d2 in 1u64..=1_000_000,
        ) {
            let change = d1.abs_diff(d2) as f64 / d2 as f64;
            prop_assume!(change > 0.08);

            let mut inhibitor = settled_on(d1);
            prop_assert_eq!(inhibitor.feed_fine(d2), Stability::Disturbed);
            prop_assert!(inhibitor.is_inhibited());

            inhibitor.feed_coarse(d2);
            prop_assert!(inhibitor.is_inhibited());
            inhibitor.feed_coarse(d2);
            prop_assert!(!inhibitor.is_inhibited());
        }

        // Property: a change at or below threshold never arms a settled gate
        #[test]
        fn small_change_does_not_inhibit(
            (d2, step, slower) in (1u64..=1_000_000)
                .prop_flat_map(|d2| (Just(d2), 0..=d2 * 8 / 100, any::<bool>())),
        ) {
            let d1 = if slower { d2 - step } else { d2 + step };
            let change = d1.abs_diff(d2) as f64 / d2 as f64;
            prop_assume!(change <= 0.08);

            let mut inhibitor = settled_on(d1);
            prop_assert_eq!(inhibitor.feed_fine(d2), Stability::Stable);
            prop_assert!(!inhibitor.is_inhibited());
        }

        // Property: the cooldown never exceeds its configured length and
        // status always mirrors the counter
        #[test]
        fn cooldown_is_bounded_and_status_is_derived(
            cooldown_rounds in 1u16..=8,
            feeds in prop::collection::vec(feed(), 0..300),
        ) {
            let config = InhibitorConfig { cooldown_rounds, ..Default::default() };
            let mut inhibitor = Inhibitor::new(config).unwrap();
            for f in feeds {
                let before = inhibitor.state();
                match f {
                    Feed::Fine(d) => {
                        let verdict = inhibitor.feed_fine(d);
                        prop_assert_eq!(inhibitor.last_round_duration(), d);
                        if verdict == Stability::Disturbed {
                            prop_assert_eq!(inhibitor.remaining_cooldown_rounds(), cooldown_rounds);
                        } else {
                            prop_assert_eq!(
                                inhibitor.remaining_cooldown_rounds(),
                                before.remaining_cooldown_rounds
                            );
                        }
                    }
                    Feed::Coarse => {
                        inhibitor.feed_coarse(0);
                        prop_assert_eq!(
                            inhibitor.remaining_cooldown_rounds(),
                            before.remaining_cooldown_rounds.saturating_sub(1)
                        );
                    }
                }
                prop_assert!(inhibitor.remaining_cooldown_rounds() <= cooldown_rounds);
                prop_assert_eq!(
                    inhibitor.is_inhibited(),
                    inhibitor.remaining_cooldown_rounds() != 0
                );
            }
        }

        // Property: zero-length rounds always inhibit
        #[test]
        fn zero_round_always_inhibits(previous in 0u64..=10_000_000) {
            let mut inhibitor = settled_on(previous.max(1));
            inhibitor.feed_fine(previous);
            prop_assert_eq!(inhibitor.feed_fine(0), Stability::Disturbed);
            prop_assert!(inhibitor.is_inhibited());
        }
    }
}
