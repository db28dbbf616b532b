use super::*;

#[test]
fn power_binds_tighter_than_product() {
    let mut table = make_table();
    let res = eval_define(&mut table, "FUX", "2 * 3 ^ 2");
    assert_close(res.scalar_value(), 18.0);
}

#[test]
fn parentheses_override_precedence() {
    let mut table = make_table();
    let res = eval_define(&mut table, "FUX", "(2 * 3) ^ 2");
    assert_close(res.scalar_value(), 36.0);
}

#[test]
fn well_expression_covers_every_well() {
    let mut table = make_table();
    let res = eval_define(&mut table, "WUX", "WOPR * 2");
    assert_eq!(res.len(), 3);
    assert_close(res.get_named("OP1").and_then(|e| e.value()), 200.0);
    assert_close(res.get_named("OP3").and_then(|e| e.value()), 600.0);
}

#[test]
fn wildcard_selector_restricts_the_well_set() {
    let mut table = make_table();
    let res = eval_define(&mut table, "WUX", "WOPR 'OP1*'");
    assert_close(res.get_named("OP1").and_then(|e| e.value()), 100.0);
    assert_eq!(res.get_named("OP2").and_then(|e| e.value()), None);
}

#[test]
fn named_well_is_a_scalar() {
    let mut table = make_table();
    let res = eval_define(&mut table, "FUX", "WOPR 'OP2' + 1");
    assert_close(res.scalar_value(), 201.0);
}

#[test]
fn reduction_of_a_well_set_is_a_field_value() {
    let mut table = make_table();
    let res = eval_define(&mut table, "FUOPR", "SUM(WOPR 'OP*')");
    assert_close(res.scalar_value(), 600.0);

    let res = eval_define(&mut table, "FUMAX", "MAX(WWCT)");
    assert_close(res.scalar_value(), 0.9);
}

#[test]
fn scalar_result_is_broadcast_to_wells() {
    let mut table = make_table();
    let res = eval_define(&mut table, "WUX", "SUM(WOPR) / 6");
    assert_eq!(res.defined_size(), 3);
    assert_close(res.get_named("OP2").and_then(|e| e.value()), 100.0);
    assert_close(res.get_named("OP3").and_then(|e| e.value()), 100.0);
}

#[test]
fn field_value_cannot_define_a_well_quantity() {
    let mut table = make_table();
    assert_eq!(
        try_eval_define(&mut table, "WUX", "FOPR / 6"),
        Err(udq::UdqError::InvalidConversion {
            expected: "WELL_VAR",
            got: "FIELD_VAR",
        })
    );
}

#[test]
fn group_wildcard_selectors_are_rejected() {
    let mut table = make_table();
    let res = eval_define(&mut table, "GUX", "GOPR 'G1' * 2");
    assert_close(res.get_named("G2").and_then(|e| e.value()), 600.0);

    let err = try_eval_define(&mut table, "GUX", "GOPR 'G*' * 2").unwrap_err();
    assert_eq!(err, udq::UdqError::GroupWildcard("G*".into()));
    assert!(err.to_string().contains("wildcards"));
}

#[test]
fn values_outside_range_are_undefined() {
    let mut table = UdqFunctionTable::new(UdqParams {
        range: 1000.0,
        ..UdqParams::default()
    });
    let res = eval_define(&mut table, "WUX", "WOPR * 4");
    assert_close(res.get_named("OP1").and_then(|e| e.value()), 400.0);
    assert_eq!(res.get_named("OP3").and_then(|e| e.value()), None);
    assert_eq!(res.defined_size(), 2);
}

#[test]
fn simulation_random_stream_is_reproducible() {
    let mut first = make_table();
    let mut second = make_table();
    let a = eval_define(&mut first, "WUR", "RANDN(WOPR)");
    let b = eval_define(&mut second, "WUR", "RANDN(WOPR)");
    assert_eq!(a.defined_values(), b.defined_values());

    let c = eval_define(&mut first, "WUR", "RANDN(WOPR)");
    assert_ne!(a.defined_values(), c.defined_values());

    first.reseed(42);
    let d = eval_define(&mut first, "WUR", "RANDN(WOPR)");
    assert_eq!(a.defined_values(), d.defined_values());
}
