/// Property-based tests using proptest
/// Invariants of the scoring pipeline that must hold for all inputs
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use lezelote_api::scoring::{
    calculate_score, evaluate, generate_insights, parse_activity_timestamp, predict_value,
    FixedJitter, LeadAttributes, RngJitter, BASE_LEAD_VALUE, JITTER_MAX, MAX_SCORE,
};
use lezelote_api::utils::{page_bounds, MAX_PAGE_SIZE};
use lezelote_api::models::Pagination;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
}

fn arb_source() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("Referral".to_string())),
        Just(Some("linkedin".to_string())),
        Just(Some("WEBSITE".to_string())),
        Just(Some("Email Campaign".to_string())),
        Just(Some("cold call".to_string())),
        "[a-z ]{0,12}".prop_map(Some),
    ]
}

fn arb_activity() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        (0i64..400).prop_map(|days| Some((now() - Duration::days(days)).to_rfc3339())),
        (0i64..30).prop_map(|days| Some((now() + Duration::days(days)).to_rfc3339())),
        "\\PC{0,20}".prop_map(Some),
    ]
}

fn arb_lead() -> impl Strategy<Value = LeadAttributes> {
    (
        "[a-zA-Z ]{0,16}",
        prop_oneof!["[a-z]{1,8}@[a-z]{1,8}\\.[a-z]{2,3}", "\\PC{0,20}"],
        proptest::option::of("[a-zA-Z ]{0,12}"),
        proptest::option::of("[0-9 +]{0,14}"),
        arb_source(),
        arb_activity(),
    )
        .prop_map(|(name, email, company, phone, source, last_activity)| LeadAttributes {
            name,
            email,
            company,
            phone,
            source,
            last_activity,
        })
}

proptest! {
    #[test]
    fn score_never_exceeds_max(lead in arb_lead()) {
        prop_assert!(calculate_score(&lead, now()) <= MAX_SCORE);
    }

    #[test]
    fn adding_a_company_never_lowers_the_score(lead in arb_lead()) {
        let without = LeadAttributes { company: None, ..lead.clone() };
        let with = LeadAttributes { company: Some("Acme".to_string()), ..lead };
        prop_assert!(calculate_score(&with, now()) >= calculate_score(&without, now()));
    }

    #[test]
    fn adding_a_phone_never_lowers_the_score(lead in arb_lead()) {
        let without = LeadAttributes { phone: None, ..lead.clone() };
        let with = LeadAttributes { phone: Some("+33 1 23 45 67 89".to_string()), ..lead };
        prop_assert!(calculate_score(&with, now()) >= calculate_score(&without, now()));
    }

    #[test]
    fn value_is_non_negative_and_bounded(lead in arb_lead(), seed in any::<u64>()) {
        let score = calculate_score(&lead, now());
        let value = predict_value(&lead, score, &mut RngJitter::seeded(seed));
        // company 1.5 x referral 2.0 x full score x max jitter
        let ceiling = BASE_LEAD_VALUE * 1.5 * 2.0 * JITTER_MAX;
        prop_assert!(value >= 0.0);
        prop_assert!(value <= ceiling + 0.01);
    }

    #[test]
    fn negative_jitter_is_clamped_to_zero(lead in arb_lead(), factor in -5.0f64..0.0) {
        let score = calculate_score(&lead, now());
        prop_assert_eq!(predict_value(&lead, score, &mut FixedJitter(factor)), 0.0);
    }

    #[test]
    fn value_is_rounded_to_cents(lead in arb_lead(), seed in any::<u64>()) {
        let score = calculate_score(&lead, now());
        let value = predict_value(&lead, score, &mut RngJitter::seeded(seed));
        let cents = value * 100.0;
        prop_assert!((cents - cents.round()).abs() < 1e-6);
    }

    #[test]
    fn insights_start_with_a_tier_and_stay_short(lead in arb_lead()) {
        let score = calculate_score(&lead, now());
        let insights = generate_insights(&lead, score, now());
        prop_assert!(!insights.is_empty());
        prop_assert!(insights.len() <= 4);
        prop_assert!(insights[0].contains("conversion"));
    }

    #[test]
    fn evaluate_matches_the_individual_steps(lead in arb_lead(), factor in 0.8f64..=1.2) {
        let result = evaluate(&lead, now(), &mut FixedJitter(factor));
        let score = calculate_score(&lead, now());
        prop_assert_eq!(result.score, score);
        prop_assert_eq!(result.predicted_value, predict_value(&lead, score, &mut FixedJitter(factor)));
        prop_assert_eq!(result.insights, generate_insights(&lead, score, now()));
    }

    #[test]
    fn timestamp_parsing_never_panics(raw in "\\PC*") {
        let _ = parse_activity_timestamp(&raw);
    }

    #[test]
    fn page_bounds_are_always_usable(skip in any::<Option<i64>>(), limit in any::<Option<i64>>()) {
        let (offset, limit) = page_bounds(&Pagination { skip, limit });
        prop_assert!(offset >= 0);
        prop_assert!((1..=MAX_PAGE_SIZE).contains(&limit));
    }
}
