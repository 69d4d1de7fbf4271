use super::common::*;
use crate::access::AuthorizationError;
use crate::workflows::promotion::domain::{ComponentWrite, Experience, ScoreComponents};
use crate::workflows::promotion::normalization::{population_max, PopulationField};
use crate::workflows::promotion::{
    EvaluationEngine, EvaluationError, PopulationMaxima, ValidationError,
};

fn experience(total_years: u32, related_years: Option<u32>) -> Experience {
    Experience {
        total_years,
        related_years,
    }
}

#[test]
fn empty_population_yields_zero_contributions() {
    let engine = EvaluationEngine::new();
    assert_eq!(population_max(&[], PopulationField::TotalTenure), 0);
    assert_eq!(population_max(&[], PopulationField::RelatedTenure), 0);
    assert_eq!(engine.compute_tenure_contribution(&experience(10, None), 0), 0.0);
    assert_eq!(
        engine.compute_post_promotion_contribution(&experience(10, Some(4)), 0),
        0.0
    );
}

#[test]
fn tenure_contributions_scale_against_population_max() {
    let engine = EvaluationEngine::new();
    assert_close(engine.compute_tenure_contribution(&experience(10, None), 10), 20.0);
    assert_close(engine.compute_tenure_contribution(&experience(5, None), 20), 5.0);
    assert_close(
        engine.compute_post_promotion_contribution(&experience(12, Some(3)), 6),
        5.0,
    );
    assert_eq!(
        engine.compute_post_promotion_contribution(&experience(12, None), 6),
        0.0
    );
}

#[test]
fn performance_score_is_weighted_at_a_quarter() {
    let engine = EvaluationEngine::new();
    assert_eq!(
        engine.set_performance_score(80.0),
        Ok(ComponentWrite::Performance {
            raw: 80.0,
            contribution: 20.0
        })
    );
    assert!(engine.set_performance_score(0.0).is_ok());
    assert!(engine.set_performance_score(100.0).is_ok());
}

#[test]
fn ratings_outside_bounds_are_rejected() {
    let engine = EvaluationEngine::new();
    for raw in [-1.0, 101.0] {
        assert!(matches!(
            engine.set_performance_score(raw),
            Err(EvaluationError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(matches!(
            engine.set_manager_recommendation(raw),
            Err(EvaluationError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }
}

#[test]
fn district_recommendation_checks_caller_branch() {
    let engine = EvaluationEngine::new();
    let (service, _) = build_service();
    let candidate = service
        .create_candidate(&admin(), draft("F-1", "Hana Tesfaye", date(2014, 6, 1)))
        .expect("candidate created");

    assert_eq!(
        engine.set_district_recommendation(&candidate, 60.0, "Bole"),
        Ok(ComponentWrite::DistrictRecommendation { contribution: 9.0 })
    );
    assert_eq!(
        engine.set_district_recommendation(&candidate, 60.0, "Adama"),
        Err(EvaluationError::Authorization(
            AuthorizationError::BranchMismatch {
                caller: "Adama".to_string(),
                candidate: "Bole".to_string(),
            }
        ))
    );
}

#[test]
fn recompute_total_is_idempotent() {
    let engine = EvaluationEngine::new();
    let scores = ScoreComponents {
        performance: Some(20.0),
        tenure: Some(13.5),
        manager_recommendation: Some(10.0),
        ..ScoreComponents::default()
    };
    let first = engine.recompute_total(&scores);
    let second = engine.recompute_total(&scores);
    assert_eq!(first, second);
    assert_close(first, 43.5);
}

#[test]
fn initialize_reseeds_tenure_components() {
    let engine = EvaluationEngine::new();
    let fresh = experience(8, Some(2));
    let maxima = PopulationMaxima {
        total_tenure: 10,
        related_tenure: 4,
    }
    .including(&fresh);

    match engine.initialize(fresh, maxima) {
        ComponentWrite::Reset {
            experience,
            tenure,
            post_promotion,
        } => {
            assert_eq!(experience, fresh);
            assert_close(tenure, 16.0);
            assert_close(post_promotion, 5.0);
        }
        other => panic!("expected reset, got {other:?}"),
    }
}

#[test]
fn maxima_never_fall_below_the_scored_candidate() {
    let raised = PopulationMaxima::default().including(&experience(7, Some(3)));
    assert_eq!(raised.total_tenure, 7);
    assert_eq!(raised.related_tenure, 3);

    let kept = PopulationMaxima {
        total_tenure: 30,
        related_tenure: 9,
    }
    .including(&experience(7, None));
    assert_eq!(kept.total_tenure, 30);
    assert_eq!(kept.related_tenure, 9);
}
