//! Data-model behavior exercised through the public API.

use usd::value::{
    Animatable, TimeCode, TimeSampleInterpolation, TypedTimeSamples, Value,
};

#[test]
fn test_held_sampling_picks_floor() {
    let mut ts = TypedTimeSamples::new();
    ts.add_sample(0.0, 10.0f64);
    ts.add_sample(5.0, 20.0f64);
    ts.add_sample(10.0, 30.0f64);
    let a = Animatable::TimeSamples(ts);

    for (t, expect) in [
        (0.0, 10.0),
        (4.999, 10.0),
        (5.0, 20.0),
        (9.0, 20.0),
        (10.0, 30.0),
        (100.0, 30.0),
    ] {
        assert_eq!(a.sample_at(t, TimeSampleInterpolation::Held), Some(expect));
    }
}

#[test]
fn test_linear_sampling_interpolates() {
    let mut ts = TypedTimeSamples::new();
    ts.add_sample(0.0, 0.0f64);
    ts.add_sample(4.0, 8.0f64);
    let a = Animatable::TimeSamples(ts);

    assert_eq!(a.sample_at(1.0, TimeSampleInterpolation::Linear), Some(2.0));
    assert_eq!(a.sample_at(3.0, TimeSampleInterpolation::Linear), Some(6.0));
    // Outside the range: clamped to the boundary samples.
    assert_eq!(a.sample_at(-1.0, TimeSampleInterpolation::Linear), Some(0.0));
    assert_eq!(a.sample_at(9.0, TimeSampleInterpolation::Linear), Some(8.0));
}

#[test]
fn test_default_time_code_returns_first_sample() {
    let mut ts = TypedTimeSamples::new();
    ts.add_sample(2.0, 7i32);
    ts.add_sample(3.0, 8i32);
    let a = Animatable::TimeSamples(ts);
    assert_eq!(a.sample_held(TimeCode::DEFAULT), Some(7));
}

#[test]
fn test_vector_lerp() {
    use usd::util::Vec3;
    let mut ts = TypedTimeSamples::new();
    ts.add_sample(0.0, Vec3::ZERO);
    ts.add_sample(2.0, Vec3::new(2.0, 4.0, 6.0));
    let a = Animatable::TimeSamples(ts);
    assert_eq!(
        a.sample_at(1.0, TimeSampleInterpolation::Linear),
        Some(Vec3::new(1.0, 2.0, 3.0))
    );
}

#[test]
fn test_blocked_samples_hold_nothing() {
    let mut ts = TypedTimeSamples::new();
    ts.add_sample(0.0, 1.0f32);
    ts.add_blocked_sample(5.0);
    ts.add_sample(10.0, 3.0f32);

    assert_eq!(ts.sample_held(2.0), Some(1.0));
    assert_eq!(ts.sample_held(7.0), None);
    assert_eq!(ts.sample_held(10.0), Some(3.0));
}

#[test]
fn test_generic_time_samples_duplicate_times() {
    let mut ts = usd::value::TimeSamples::new();
    ts.add_sample(1.0, Value::Int(1));
    ts.add_sample(1.0, Value::Int(2));
    ts.add_sample(0.0, Value::Int(0));

    // Times stay non-decreasing; the later write at t=1 wins.
    assert_eq!(ts.times(), vec![0.0, 1.0, 1.0]);
    assert_eq!(ts.sample_at(1.0).unwrap().value, Some(Value::Int(2)));
}

#[test]
fn test_value_type_names_and_ids() {
    use usd::value::{TypeId, ValueType};

    assert_eq!(Value::Bool(true).type_id(), TypeId::Bool);
    assert_eq!(Value::TokenArray(vec![]).type_name(), "token[]");
    assert_eq!(Value::Double(0.0).type_name(), "double");

    // Arrayability follows the wire table.
    assert!(ValueType::from_id(TypeId::Vec3f as i32).unwrap().supports_array);
    assert!(!ValueType::from_id(TypeId::Dictionary as i32)
        .unwrap()
        .supports_array);
}

#[test]
fn test_listop_preserved_not_composed() {
    use usd::value::ListOp;

    let mut op: ListOp<i32> = ListOp::default();
    op.prepended_items = vec![1, 2];
    op.deleted_items = vec![3];
    assert!(!op.is_explicit);
    assert_eq!(op.prepended_items, vec![1, 2]);
    assert_eq!(op.deleted_items, vec![3]);

    let explicit = ListOp::explicit(vec![9]);
    assert!(explicit.is_explicit);
    assert_eq!(explicit.explicit_items, vec![9]);
}
