use std::time::{SystemTime, UNIX_EPOCH};

use rill_core::{environment::prelude::Value, eval::prelude::Interpreter};

/// Installs the built-in functions into the interpreter's globals. Runs
/// before any program statement executes.
pub fn register(interpreter: &mut Interpreter) {
    interpreter.define_native("clock", 0, |_arguments| {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| "System clock is set before the epoch.".to_string())?;

        Ok(Value::Number(now.as_secs_f64()))
    });

    interpreter.define_native("sqrt", 1, |arguments| {
        let x = match &arguments[0] {
            Value::Number(x) => *x,
            _ => return Err("Argument must be a number.".to_string()),
        };

        // Newton iteration, truncated to three decimals.
        let mut approx = 1.0;
        let mut steps = 0;

        while (approx * approx - x).abs() > 0.001 && steps < 1000 {
            approx = 0.5 * (approx + x / approx);
            steps += 1;
        }

        Ok(Value::Number(approx - approx % 0.001))
    });
}
