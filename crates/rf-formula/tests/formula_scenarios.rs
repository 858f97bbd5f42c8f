//! End-to-end scenarios over the full pipeline: macro rewriting, symbol
//! resolution and bytecode evaluation.

use rf_formula::{preprocess, Formula};

#[test]
fn sinc_at_one() {
    let mut f = Formula::new("sc_sinc", "sin(x)/x");
    assert!(f.ready());
    assert_eq!(f.ndim(), 1);
    assert_eq!(f.npar(), 0);
    f.set_variable("x", 1.0);
    assert!((f.eval() - 0.8414709848).abs() < 1e-9);
}

#[test]
fn damped_oscillation() {
    let mut f = Formula::new("sc_damped", "[0]*sin(x)+[1]*exp(-[2]*x)");
    assert!(f.ready());
    assert_eq!(f.ndim(), 1);
    assert_eq!(f.npar(), 3);
    f.set_parameters(&[1.0, 2.0, 0.5]);
    let v = f.eval1(1.0);
    assert!((v - 2.0545323042).abs() < 1e-9, "got {v}");
}

#[test]
fn gaus_family() {
    let mut f = Formula::new("sc_gaus", "gaus(0)");
    assert!(f.ready());
    assert_eq!(f.number(), 100);
    assert_eq!(f.npar(), 3);
    f.set_parameters(&[1.0, 0.0, 1.0]);
    assert!((f.eval1(0.0) - 1.0).abs() < 1e-12);
    assert!((f.eval1(1.0) - 0.6065306597).abs() < 1e-9);
}

#[test]
fn gausn_is_normalized() {
    let mut f = Formula::new("sc_gausn", "gausn(0)");
    assert!(f.ready());
    assert!(f.is_normalized());
    f.set_parameters(&[1.0, 0.0, 2.0]);
    // peak of the unit-amplitude normalized gaussian: 1/(sqrt(2*pi)*sigma).
    // pi is inlined with six decimals, so compare loosely.
    let expected = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * 2.0);
    assert!((f.eval1(0.0) - expected).abs() < 1e-7);
}

#[test]
fn pol3_with_offset() {
    let mut f = Formula::new("sc_pol3", "pol3(2)");
    assert!(f.ready());
    assert_eq!(f.number(), 303);
    assert!(f.is_linear());
    assert_eq!(f.npar(), 4);
    for i in 2..=5 {
        f.set_parameter(&i.to_string(), 1.0);
    }
    assert!((f.eval1(2.0) - 15.0).abs() < 1e-12);
}

#[test]
fn xygaus_two_dimensional() {
    let mut f = Formula::new("sc_xygaus", "xygaus(0)");
    assert!(f.ready());
    assert_eq!(f.ndim(), 2);
    assert_eq!(f.npar(), 5);
    f.set_parameters(&[1.0, 0.0, 1.0, 0.0, 1.0]);
    assert!((f.eval2(0.0, 0.0) - 1.0).abs() < 1e-12);
    // separable: f(1,0) = exp(-0.5)
    assert!((f.eval2(1.0, 0.0) - 0.6065306597).abs() < 1e-9);
}

#[test]
fn linear_composition_parts() {
    let mut f = Formula::new("sc_linear", "x++y");
    assert!(f.ready());
    assert!(f.is_linear());
    assert_eq!(f.canonical(), "(p[0]*(x[0]))+(p[1]*(x[1]))");
    assert_eq!(f.linear_parts().len(), 2);
    assert_eq!(f.linear_part(0).unwrap().expression(), "x");
    assert_eq!(f.linear_part(1).unwrap().expression(), "y");
    f.set_parameters(&[3.0, 4.0]);
    assert!((f.eval2(1.0, 1.0) - 7.0).abs() < 1e-12);

    // linear parts are compiled sub-formulas in their own right
    let part = f.linear_part_mut(0).unwrap();
    assert!(part.ready());
    assert_eq!(part.eval1(5.0), 5.0);
}

#[test]
fn landau_family() {
    let mut f = Formula::new("sc_landau", "landau(0)");
    assert!(f.ready());
    assert_eq!(f.number(), 200);
    f.set_parameters(&[1.0, 0.0, 1.0]);
    assert!((f.eval1(0.0) - 0.1788541609).abs() < 1e-9);
}

#[test]
fn expo_family() {
    let mut f = Formula::new("sc_expo", "expo(0)");
    assert!(f.ready());
    assert_eq!(f.number(), 400);
    f.set_parameters(&[1.0, -0.5]);
    assert!((f.eval1(2.0) - (1.0 - 0.5 * 2.0f64).exp()).abs() < 1e-12);
    assert!((f.eval1(4.0) - (1.0 - 0.5 * 4.0f64).exp()).abs() < 1e-12);
}

// ── Algebraic properties ───────────────────────────────────────

#[test]
fn exponentiation_associates_right() {
    let a = Formula::new("sc_pow_a", "2^3^2");
    let b = Formula::new("sc_pow_b", "pow(2,pow(3,2))");
    assert_eq!(a.canonical(), b.canonical());
}

#[test]
fn pol_expansion_matches_closed_form() {
    let a = Formula::new("sc_pol_inv", "pol2(3)");
    let b = Formula::new("sc_pol_ref", "[3]+[4]*x+[5]*x^2");
    assert_eq!(a.canonical(), b.canonical());
}

#[test]
fn preprocessing_is_idempotent() {
    for input in ["sin(x)/x", "gaus(2)+pol3(5)", "x++y", "x**2+y**2", "xylandau(1)"] {
        let once = preprocess(input);
        let twice = preprocess(&once.text);
        assert_eq!(once.text, twice.text, "not idempotent: {input}");
    }
}

#[test]
fn eval_is_a_pure_function_of_inputs() {
    let mut f = Formula::new("sc_pure", "[0]*sin(x)+[1]*exp(-[2]*x)");
    f.set_parameters(&[0.7, 1.3, 0.25]);
    let a = f.eval1(0.8);
    let b = f.eval1(0.8);
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn ndim_follows_highest_variable_slot() {
    assert_eq!(Formula::new("sc_dim1", "x+1").ndim(), 1);
    assert_eq!(Formula::new("sc_dim2", "x*y").ndim(), 2);
    assert_eq!(Formula::new("sc_dim4", "t").ndim(), 4);
    assert_eq!(Formula::new("sc_dim_idx", "x[6]").ndim(), 7);
    // parameters but no variables: auto 1-D
    assert_eq!(Formula::new("sc_dim_par", "[0]+[1]").ndim(), 1);
}

#[test]
fn canonical_tokens_are_closed_over_backend() {
    // Every canonical form must compile on the bytecode back-end, which only
    // accepts x/p slots, literals and qualified calls.
    for (name, text) in [
        ("sc_tok1", "gaus(0)+pol2(3)"),
        ("sc_tok2", "landau(0)*expo(3)"),
        ("sc_tok3", "sqrt2*sin(pi*x)"),
        ("sc_tok4", "atan2(y,x)+binomial(5,2)"),
    ] {
        let f = Formula::new(name, text);
        assert!(f.ready(), "{name}: {:?} unresolved", f.unresolved());
        assert!(rf_formula::CompiledFormula::compile(f.canonical()).is_ok());
    }
}

// ── Nested formulas and the directory ──────────────────────────

#[test]
fn nested_formula_is_inlined() {
    let _old = Formula::new("sc_nested_old", "sin(x*(x<0.5||x>1))");
    let mut f = Formula::new("sc_nested_new", "x*sc_nested_old");
    assert!(f.ready(), "unresolved: {:?}", f.unresolved());
    let direct = Formula::new("sc_nested_direct", "x*sin(x*(x<0.5||x>1))");
    assert_eq!(f.canonical(), direct.canonical());
    assert!((f.eval1(0.25) - 0.25 * 0.25f64.sin()).abs() < 1e-12);
    assert!((f.eval1(0.75) - 0.0).abs() < 1e-12);
}

#[test]
fn reference_cycle_is_reported_not_looped() {
    let _a = Formula::new("sc_cyc_a", "sc_cyc_b+1");
    let _b = Formula::new("sc_cyc_b", "sc_cyc_a*2");
    let f = Formula::new("sc_cyc_c", "sc_cyc_a");
    assert!(!f.ready());
    assert!(!f.unresolved().is_empty());
    let mut f = f;
    assert_eq!(f.eval(), -1.0);
}

#[test]
fn redefinition_replaces_directory_entry() {
    let _f1 = Formula::new("sc_redef", "x+1");
    let _f2 = Formula::new("sc_redef", "x+2");
    let user = Formula::new("sc_redef_user", "sc_redef");
    assert_eq!(user.canonical(), "x[0]+2");
}

// ── Error-path behavior ────────────────────────────────────────

#[test]
fn unresolved_functor_keeps_formula_not_ready() {
    let mut f = Formula::new("sc_unres", "nosuchthing(3)+x");
    assert!(!f.ready());
    assert_eq!(f.unresolved(), vec!["nosuchthing"]);
    assert_eq!(f.eval(), -1.0);
}

#[test]
fn normalized_form_missing_halts_rewrite() {
    let mut f = Formula::new("sc_no_norm", "expon(0)");
    assert!(!f.ready());
    assert_eq!(f.eval(), -1.0);
}

#[test]
fn wrong_arity_qualified_call_is_rejected() {
    let f = Formula::new("sc_arity", "TMath::Landau(x,[0])");
    assert!(!f.ready());
    assert_eq!(f.unresolved(), vec!["TMath::Landau"]);
}

#[test]
fn bulk_parameter_set_longer_than_npar_is_ignored() {
    let mut f = Formula::new("sc_bulk", "[0]*x");
    f.set_parameter_index(0, 2.0);
    f.set_parameters(&[9.0, 9.0, 9.0]);
    assert_eq!(f.get_parameter_index(0), 2.0);
    f.set_positional_parameters(&[5.0, 9.0, 9.0]);
    assert_eq!(f.get_parameter_index(0), 5.0);
}

#[test]
fn comparison_operators_evaluate_to_unit_values() {
    let mut f = Formula::new("sc_cmp", "(x>1)+2*(x<=1)");
    assert!(f.ready());
    assert_eq!(f.eval1(2.0), 1.0);
    assert_eq!(f.eval1(0.5), 2.0);
}

#[test]
fn variadic_eval_entry_points() {
    let mut f = Formula::new("sc_entry", "x+10*y+100*z+1000*t");
    assert_eq!(f.ndim(), 4);
    assert_eq!(f.eval4(1.0, 2.0, 3.0, 4.0), 4321.0);
    // lower-arity entry points leave later slots untouched
    assert_eq!(f.eval2(5.0, 5.0), 55.0 + 300.0 + 4000.0);
    assert_eq!(f.eval_par(&[0.0, 0.0, 0.0, 1.0], None), 1000.0);
}
