/// Checks that a numerical value is in the provided interval `[a,b]` and returns early
/// with an [`Error::InvalidArgument`](crate::error::Error::InvalidArgument) naming the
/// offending expression if not
///
/// ### Example
/// ```ignore
/// let lr = 2.0;
/// ensure_interval!(lr, 0.0, 1.0);
/// ```
/// This returns `Err` with the message "invalid argument: Invalid value for \`lr\`: 2. Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::error::Error::InvalidArgument(format!(
                "Invalid value for `{}`: {}. Must be in the interval [{}, {}].",
                stringify!($var),
                $var,
                $a,
                $b,
            )));
        }
    };
}
