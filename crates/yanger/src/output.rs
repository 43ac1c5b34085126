//! JSON rendering for stdout.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::CliError;

/// Pretty JSON by default; `compact` gives a single line.
pub fn render<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let text = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(text)
}

/// Write `output` and a newline to stdout.
pub fn print_output(output: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pretty_and_compact() {
        let value = json!({"ietf-ntp:ntp": {"port": 123}});
        assert_eq!(render(&value, true).unwrap(), r#"{"ietf-ntp:ntp":{"port":123}}"#);
        assert_eq!(
            render(&value, false).unwrap(),
            "{\n  \"ietf-ntp:ntp\": {\n    \"port\": 123\n  }\n}"
        );
    }
}
