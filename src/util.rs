/// Checks that a numerical value is in the interval `[a,b]` and returns early with
/// [`Error::InvalidParameter`](crate::Error::InvalidParameter) if not
///
/// The field name used in the error is the last path segment of the expression,
/// so `config.learning_rate` reports `learning_rate`.
///
/// ### Example
/// ```ignore
/// let value = 2.0;
/// check_interval!(value, 0.0, 1.0);
/// ```
/// This returns `Err(Error::InvalidParameter { name: "value", value: 2.0 })`.
#[macro_export]
macro_rules! check_interval {
    ($var:expr, $a:expr, $b:expr) => {
        let value = $var as f64;
        // NaN fails both comparisons
        if !(value >= $a && value <= $b) {
            return Err($crate::Error::InvalidParameter {
                name: $crate::util::field_name(stringify!($var)),
                value,
            });
        }
    };
}

/// Strips any receiver path from a stringified expression
pub fn field_name(expr: &'static str) -> &'static str {
    expr.rsplit('.').next().unwrap_or(expr).trim()
}
