use crate::agent::{EpsilonSchedule, EPSILON_DECAY_SPEEDUP};
use crate::config::AgentConfig;

#[test]
fn test_decay_factor_from_warmup() {
    let schedule = EpsilonSchedule::new(1.0, 0.1, 1000);
    assert_eq!(EPSILON_DECAY_SPEEDUP, 2.0);
    assert!((schedule.decay_factor() - 0.9982).abs() < 1e-6);
    assert_eq!(schedule.value(), 1.0);
}

#[test]
fn test_hundred_episodes_of_decay() {
    let mut schedule = EpsilonSchedule::new(1.0, 0.1, 1000);
    for _ in 0..100 {
        schedule.step();
    }
    assert!((schedule.value() - 0.9982_f32.powi(100)).abs() < 1e-3);
    assert!((schedule.value() - 0.835).abs() < 1e-3);
}

#[test]
fn test_monotone_and_floored() {
    let mut schedule = EpsilonSchedule::new(1.0, 0.1, 1000);
    let mut previous = schedule.value();
    for _ in 0..5000 {
        schedule.step();
        assert!(schedule.value() <= previous);
        assert!(schedule.value() >= 0.1);
        previous = schedule.value();
    }
    assert_eq!(schedule.value(), 0.1);
}

#[test]
fn test_aggressive_decay_is_clamped() {
    // a warmup this short would make the factor negative
    let mut schedule = EpsilonSchedule::new(1.0, 0.1, 1);
    assert_eq!(schedule.decay_factor(), 0.0);
    schedule.step();
    assert_eq!(schedule.value(), 0.1);
}

#[test]
fn test_no_decay_at_floor() {
    let mut schedule = EpsilonSchedule::with_decay(0.1, 0.1, 0.5);
    schedule.step();
    assert_eq!(schedule.value(), 0.1);
}

#[test]
fn test_from_config() {
    let config = AgentConfig::default();
    let schedule = EpsilonSchedule::from_config(&config);
    let expected = 1.0 - ((config.initial_epsilon - config.min_epsilon) / config.nb_warmup as f32) * 2.0;
    assert_eq!(schedule.decay_factor(), expected);
    assert_eq!(schedule.min(), config.min_epsilon);
}

#[test]
fn test_override_below_floor_is_kept() {
    let mut schedule = EpsilonSchedule::new(1.0, 0.1, 1000);
    schedule.set_value(0.05);
    assert_eq!(schedule.value(), 0.05);
    for _ in 0..10 {
        schedule.step();
    }
    assert_eq!(schedule.value(), 0.05);
    assert_eq!(schedule.min(), 0.1);

    schedule.set_value(1.5);
    assert_eq!(schedule.value(), 1.0);
}
