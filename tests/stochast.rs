//! Random variables and correlation matrices through the public API.

use limitstate::core::standard_normal::{p_from_u, q_from_u, u_from_q};
use limitstate::core::{ConstantParameter, DiscreteValue, Parameter};
use limitstate::{CorrelationMatrix, DistributionType, SelfCorrelationMatrix, Stochast};
use proptest::prelude::*;

// =============================================================================
// STANDARD NORMAL
// =============================================================================

proptest! {
    #[test]
    fn probability_round_trip(q in 1e-10f64..0.999_999_9) {
        let u = u_from_q(q).unwrap();
        prop_assert!((p_from_u(u) - (1.0 - q)).abs() < 1e-6);
    }

    #[test]
    fn index_round_trip_upper_tail(u in -6.0f64..7.5) {
        prop_assert!((u_from_q(q_from_u(u)).unwrap() - u).abs() < 1e-6);
    }

    #[test]
    fn index_round_trip_lower_tail(u in -7.5f64..0.0) {
        prop_assert!((-u_from_q(p_from_u(u)).unwrap() - u).abs() < 1e-6);
    }
}

// =============================================================================
// DISTRIBUTIONS
// =============================================================================

#[test]
fn discrete_mean_follows_amounts() {
    let mut stochast = Stochast::discrete(
        "d",
        vec![DiscreteValue::new(2.0, 1.0), DiscreteValue::new(3.0, 3.0)],
    );
    assert!((stochast.mean() - 2.75).abs() < 1e-9);

    stochast.remove_discrete_value(0);
    assert_eq!(stochast.mean(), 3.0);
}

#[test]
fn fit_normal_to_sample() {
    let mut stochast = Stochast::with_distribution("f", DistributionType::Normal);
    stochast.fit(&[4.1, 4.2, 4.4, 4.5]).unwrap();
    assert!((stochast.mean() - 4.3).abs() < 1e-9);
    assert!((stochast.deviation() - 0.18).abs() < 0.01, "deviation {}", stochast.deviation());
    assert_eq!(stochast.observations(), 4);
}

#[test]
fn distribution_names_round_trip() {
    for name in ["normal", "log_normal", "uniform", "gumbel", "weibull", "discrete", "cdf_curve"] {
        let kind = DistributionType::from_name(name).unwrap();
        assert_eq!(kind.to_string(), name);
    }
    assert!(DistributionType::from_name("lognormal_3p").is_none());
}

#[test]
fn transform_is_monotone_and_invertible() {
    let mut stochast = Stochast::with_distribution("g", DistributionType::Gumbel);
    stochast.set_location(10.0);
    stochast.set_scale(2.0);
    let mut previous = f64::NEG_INFINITY;
    for step in -10..=10 {
        let u = step as f64 * 0.5;
        let x = stochast.x_from_u(u);
        assert!(x > previous, "x_from_u not increasing at u = {u}");
        assert!((stochast.u_from_x(x) - u).abs() < 1e-5);
        previous = x;
    }
}

#[test]
fn unused_parameter_does_not_matter() {
    let mut stochast = Stochast::uniform("u", 0.0, 1.0);
    stochast.set_parameter(Parameter::Scale, -1.0);
    assert!(stochast.is_valid());

    stochast.set_distribution(DistributionType::Gumbel);
    assert!(!stochast.is_valid());
}

#[test]
fn constant_variation_keeps_ratio() {
    let mut stochast = Stochast::normal("n", 10.0, 1.0);
    stochast.set_constant_parameter(ConstantParameter::Variation);
    stochast.set_mean(20.0);
    assert!((stochast.deviation() - 2.0).abs() < 1e-9);
}

// =============================================================================
// CORRELATION MATRICES
// =============================================================================

#[test]
fn correlation_is_symmetric_with_unit_diagonal() {
    let a = Stochast::normal("a", 0.0, 1.0);
    let b = Stochast::normal("b", 0.0, 1.0);
    let c = Stochast::normal("c", 0.0, 1.0);
    let mut matrix = CorrelationMatrix::new();
    matrix.set_correlation(&a, &b, 0.8);

    assert_eq!(matrix.get_correlation(&a, &b), 0.8);
    assert_eq!(matrix.get_correlation(&b, &a), 0.8);
    assert_eq!(matrix.get_correlation(&a, &c), 0.0);
    assert_eq!(matrix.get_correlation(&c, &c), 1.0);
}

#[test]
fn self_correlation_is_optional() {
    let a = Stochast::normal("a", 0.0, 1.0);
    let mut matrix = SelfCorrelationMatrix::new();
    assert_eq!(matrix.get_self_correlation(&a), None);
    assert_eq!(matrix.get_or(&a, 1.0), 1.0);
    matrix.set_self_correlation(&a, 0.3);
    assert_eq!(matrix.get_self_correlation(&a), Some(0.3));
}
