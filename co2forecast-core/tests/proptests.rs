//! Property tests for factor composition, overrides and reserve depletion

use std::sync::Arc;

use co2forecast_core::{
    ConversionConstant, EmissionsCalculator, EngineConfig, GraphBuilder, Gwp, ProductionDatapoint,
    ReserveBalance,
};
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

/// Sorted positive (low, mid, high)
fn hop_factor() -> impl Strategy<Value = (f64, f64, f64)> {
    prop::array::uniform3(0.01f64..100.0).prop_map(|mut v| {
        v.sort_by(|a, b| a.total_cmp(b));
        (v[0], v[1], v[2])
    })
}

fn chain(fuel: &str, target: &str, hops: &[(f64, f64, f64)]) -> Vec<ConversionConstant> {
    hops.iter()
        .enumerate()
        .map(|(i, &(low, mid, high))| {
            let to = if i + 1 == hops.len() {
                target.to_string()
            } else {
                format!("u{}", i + 1)
            };
            ConversionConstant::new(Some(fuel), &format!("u{}", i), &to, mid, Some(low), Some(high))
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_path_factor_is_product_of_edges(hops in prop::collection::vec(hop_factor(), 1..6)) {
        let constants = chain("oil", "kgco2e", &hops);
        let set = GraphBuilder::new(&EngineConfig::default()).build(&constants, None);

        let resolved = set.resolve("u0", "kgco2e", "oil").unwrap();
        let expected: f64 = hops.iter().map(|h| h.1).product();

        prop_assert_eq!(resolved.path.len(), hops.len() + 1);
        prop_assert!(close(resolved.factor, expected));
    }

    #[test]
    fn prop_round_trip_with_inverse_constants(factor in 1e-6f64..1e6, volume in 0.0f64..1e9) {
        let constants = vec![
            ConversionConstant::new(Some("gas"), "a", "b", factor, None, None),
            ConversionConstant::new(Some("gas"), "b", "a", 1.0 / factor, None, None),
        ];
        let set = GraphBuilder::new(&EngineConfig::default()).build(&constants, None);

        let there = set.convert_volume(volume, "a", "gas", "b");
        let back = set.convert_volume(there, "b", "gas", "a");
        prop_assert!(close(back, volume));
    }

    #[test]
    fn prop_estimate_triples_are_ordered(
        hops in prop::collection::vec(hop_factor(), 1..5),
        scope1 in hop_factor(),
        volume in 0.0f64..1e9,
    ) {
        let mut constants = chain("oil", "kgco2e", &hops);
        constants.push(
            ConversionConstant::new(Some("oil"), "u0", "kgco2e", scope1.1, Some(scope1.0), Some(scope1.2))
                .with_modifier("GWP20"),
        );
        let config = EngineConfig::default();
        let set = Arc::new(GraphBuilder::new(&config).build(&constants, None));
        let calc = EmissionsCalculator::new(config, Arc::new(constants), set);

        let estimate = calc
            .estimate(&ProductionDatapoint::new("oil", volume, "u0", 2030, 1), Gwp::Gwp20)
            .unwrap();
        for triple in [estimate.scope1, estimate.scope3] {
            prop_assert!(triple[0] <= triple[1] && triple[1] <= triple[2]);
        }
    }

    #[test]
    fn prop_country_constant_wins_only_for_its_country(
        default in 0.1f64..10.0,
        specific in 10.1f64..20.0,
        use_country in any::<bool>(),
    ) {
        let constants = vec![
            ConversionConstant::new(Some("coal"), "ton", "kgco2e", default, None, None),
            ConversionConstant::new(Some("coal"), "ton", "kgco2e", specific, None, None).with_country("AU"),
        ];
        let country = if use_country { Some("AU") } else { Some("ID") };
        let set = GraphBuilder::new(&EngineConfig::default()).build(&constants, country);

        let factor = set.resolve("ton", "kgco2e", "coal").unwrap().factor;
        prop_assert_eq!(factor, if use_country { specific } else { default });
    }

    #[test]
    fn prop_depletion_is_monotonic(
        planned in 0.0f64..500.0,
        contingent in 0.0f64..500.0,
        periods in prop::collection::vec(0.0f64..200.0, 0..20),
    ) {
        let mut balance = ReserveBalance { planned, contingent };
        for production in periods {
            let before = balance;
            let (planned_prod, contin_prod) = balance.draw(production);

            prop_assert!(balance.planned <= before.planned);
            prop_assert!(balance.contingent <= before.contingent);
            prop_assert!(balance.planned >= 0.0 && balance.contingent >= 0.0);
            prop_assert!(planned_prod >= 0.0 && contin_prod >= 0.0);
            prop_assert!(planned_prod + contin_prod <= production + 1e-9);
        }
    }
}
