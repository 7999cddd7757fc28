use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_secs_f64_round_trip() {
    assert_eq!(SimTime::from_secs_f64(1.5), SimTime(1_500_000_000));
    assert_eq!(SimTime::from_secs_f64(0.0), SimTime::ZERO);
    assert_eq!(SimTime(2_000_000_000).as_secs_f64(), 2.0);
}

#[test]
fn sim_time_secs_f64_rejects_negative_and_nan() {
    assert_eq!(SimTime::from_secs_f64(-1.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NEG_INFINITY), SimTime::ZERO);
}

#[test]
fn sim_time_saturating_add() {
    assert_eq!(
        SimTime(u64::MAX).saturating_add(SimTime(1)),
        SimTime(u64::MAX)
    );
    assert_eq!(SimTime(1).saturating_add(SimTime(2)), SimTime(3));
}
