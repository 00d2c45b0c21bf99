#[cfg(test)]
mod tests {
    use crate::ast::{NdArray, Value};
    use crate::eval::*;
    use crate::scope::Scope;

    fn data_scope(d: &[f64]) -> Scope {
        let mut scope = Scope::new();
        scope.set("np", Value::Module("np".into()));
        scope.set("d", Value::Array(NdArray::from_vec(d.to_vec())));
        scope
    }

    fn eval_in(input: &str, scope: &mut Scope) -> Result<Value, EvalError> {
        Evaluator::with_seed(0).eval_str(input, scope)
    }

    fn eval_str(input: &str) -> Result<Value, EvalError> {
        eval_in(input, &mut data_scope(&[1.0, 2.0, 3.0]))
    }

    fn arr(v: &[f64]) -> Value {
        Value::Array(NdArray::from_vec(v.to_vec()))
    }

    #[test]
    fn eval_broadcast_arithmetic() {
        assert_eq!(eval_str("d * 2").unwrap(), arr(&[2.0, 4.0, 6.0]));
        assert_eq!(eval_str("(d + 1) ** 2").unwrap(), arr(&[4.0, 9.0, 16.0]));
        assert_eq!(eval_str("-d[0]").unwrap(), Value::Number(-1.0));
    }

    #[test]
    fn eval_precedence() {
        assert_eq!(eval_str("1 + 2 * 3").unwrap(), Value::Number(7.0));
        assert_eq!(eval_str("-2 ** 2").unwrap(), Value::Number(-4.0));
        assert_eq!(eval_str("2 ** 3 ** 2").unwrap(), Value::Number(512.0));
        assert_eq!(eval_str("7 // 2 + 7 % 2").unwrap(), Value::Number(4.0));
    }

    #[test]
    fn eval_np_functions() {
        assert_eq!(eval_str("np.sum(d)").unwrap(), Value::Number(6.0));
        assert_eq!(eval_str("np.mean(d)").unwrap(), Value::Number(2.0));
        assert_eq!(eval_str("np.cumsum(d)").unwrap(), arr(&[1.0, 3.0, 6.0]));
        assert_eq!(eval_str("np.arange(3) + d").unwrap(), arr(&[1.0, 3.0, 5.0]));
    }

    #[test]
    fn eval_methods() {
        assert_eq!(eval_str("d.sum()").unwrap(), Value::Number(6.0));
        assert_eq!(eval_str("d.reshape(3, 1).shape").unwrap(), arr(&[3.0, 1.0]));
        assert_eq!(eval_str("(d / 3).round(2)").unwrap(), arr(&[0.33, 0.67, 1.0]));
    }

    #[test]
    fn eval_boolean_mask() {
        assert_eq!(eval_str("d[d > 1]").unwrap(), arr(&[2.0, 3.0]));
        assert_eq!(eval_str("d[(d > 1) & (d < 3)]").unwrap(), arr(&[2.0]));
        assert_eq!(eval_str("(d > 1).sum()").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn eval_slices() {
        assert_eq!(eval_str("d[1:]").unwrap(), arr(&[2.0, 3.0]));
        assert_eq!(eval_str("d[::-1]").unwrap(), arr(&[3.0, 2.0, 1.0]));
        assert_eq!(eval_str("d[-1]").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn eval_two_dimensional() {
        let mut scope = data_scope(&[]);
        let column = eval_in("m = np.array([[1, 2], [3, 4]]); m[:, 1]", &mut scope).unwrap();
        assert_eq!(column, arr(&[2.0, 4.0]));
        assert_eq!(eval_in("m.T[0]", &mut scope).unwrap(), arr(&[1.0, 2.0]));
        assert_eq!(eval_in("m.sum(0)", &mut scope).unwrap(), arr(&[4.0, 6.0]));
    }

    #[test]
    fn eval_assignment_persists() {
        let mut scope = data_scope(&[1.0, 2.0]);
        assert_eq!(eval_in("total = d.sum()", &mut scope).unwrap(), Value::Number(3.0));
        assert_eq!(scope.get("total"), Some(&Value::Number(3.0)));
        assert_eq!(eval_in("x = 2\ny = 3\nx * y", &mut scope).unwrap(), Value::Number(6.0));
    }

    #[test]
    fn eval_strings() {
        let mut scope = Scope::new();
        scope.set("d", Value::Str("a,b,c\n".into()));
        assert_eq!(
            eval_in("d.strip().split(',')", &mut scope).unwrap(),
            Value::StrArray(vec!["a".into(), "b".into(), "c".into()])
        );
        let joined = eval_in("'-'.join(d.strip().split(','))", &mut scope).unwrap();
        assert_eq!(joined, Value::Str("a-b-c".into()));
        assert_eq!(eval_in("len(d)", &mut scope).unwrap(), Value::Number(6.0));
        assert_eq!(eval_in("'ab' * 2 + 'c'", &mut scope).unwrap(), Value::Str("ababc".into()));
    }

    #[test]
    fn eval_lines_to_numbers() {
        let mut scope = Scope::new();
        scope.set("d", Value::StrArray(vec!["1".into(), "2.5".into()]));
        assert_eq!(eval_in("float(d) * 2", &mut scope).unwrap(), arr(&[2.0, 5.0]));
        assert_eq!(eval_in("d.astype(float).sum()", &mut scope).unwrap(), Value::Number(3.5));
    }

    #[test]
    fn eval_logical_short_circuit() {
        assert_eq!(eval_str("0 or 5").unwrap(), Value::Number(5.0));
        assert_eq!(eval_str("None and undefined_name").unwrap(), Value::None);
        assert_eq!(eval_str("not d.any()").unwrap(), Value::Bool(false));
    }

    #[test]
    fn eval_builtins() {
        assert_eq!(eval_str("len(d)").unwrap(), Value::Number(3.0));
        assert_eq!(eval_str("max(d)").unwrap(), Value::Number(3.0));
        assert_eq!(eval_str("sum([1, 2, 3])").unwrap(), Value::Number(6.0));
        assert_eq!(eval_str("json(d)").unwrap(), Value::Str("[1,2,3]".into()));
        assert_eq!(eval_str("str(1.5)").unwrap(), Value::Str("1.5".into()));
    }

    #[test]
    fn eval_function_values() {
        assert_eq!(eval_str("f = np.mean; f(d)").unwrap(), Value::Number(2.0));
        assert_eq!(eval_str("np.random.seed(1)").unwrap(), Value::None);
    }

    #[test]
    fn eval_errors() {
        assert!(matches!(
            eval_str("nope + 1"),
            Err(EvalError::UndefinedName(name)) if name == "nope"
        ));
        assert!(matches!(eval_str("d + np.arange(2)"), Err(EvalError::Shape { .. })));
        assert!(matches!(
            eval_str("d[10]"),
            Err(EvalError::IndexOutOfBounds { index: 10, len: 3 })
        ));
        assert!(matches!(eval_str("np.frobnicate(d)"), Err(EvalError::UnknownFunction(_))));
        assert!(matches!(eval_str("np.frobnicate"), Err(EvalError::NoAttribute { .. })));
        assert!(matches!(eval_str("d +"), Err(EvalError::Parse(_))));
        assert!(matches!(eval_str("'open"), Err(EvalError::Lex(_))));
        assert!(matches!(eval_str("if d > 1"), Err(_)));
    }

    #[test]
    fn eval_oversized_results_are_errors() {
        assert!(matches!(eval_str("np.arange(np.inf)"), Err(EvalError::ValueError(_))));
        assert!(matches!(eval_str("len('ab' * 1e19)"), Err(EvalError::ValueError(_))));
        assert!(matches!(eval_str("np.zeros([1e10, 1e10])"), Err(EvalError::ValueError(_))));
        assert!(matches!(eval_str("d.reshape(4e9, 4e9, 4e9)"), Err(EvalError::ValueError(_))));
    }

    #[test]
    fn eval_ambiguous_truth_value() {
        assert!(matches!(eval_str("d and 1"), Err(EvalError::ValueError(_))));
    }

    #[test]
    fn eval_seeded_random_is_repeatable() {
        let mut a = data_scope(&[]);
        let mut b = data_scope(&[]);
        a.set("random", Value::Module("random".into()));
        b.set("random", Value::Module("random".into()));
        let first = Evaluator::with_seed(42).eval_str("random.random(4)", &mut a).unwrap();
        let second = Evaluator::with_seed(42).eval_str("random.random(4)", &mut b).unwrap();
        assert_eq!(first, second);
    }
}
