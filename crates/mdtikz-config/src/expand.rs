//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Bare `$VAR` is left as is. Unset variables without a default are an error.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Expand environment variables, then a leading `~`, in a program path.
pub(crate) fn expand_program(value: &str, field: &str) -> Result<String, ConfigError> {
    let value = expand_env(value, field)?;
    Ok(shellexpand::tilde(&value).into_owned())
}

struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MDTIKZ_TEST_SIMPLE", "lualatex-dev");
        }
        let result = expand_env("${MDTIKZ_TEST_SIMPLE}", "tikz.latex").unwrap();
        assert_eq!(result, "lualatex-dev");
        unsafe {
            std::env::remove_var("MDTIKZ_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDTIKZ_TEST_UNSET");
        }
        let result = expand_env("${MDTIKZ_TEST_UNSET:-pdf2svg}", "tikz.pdf2svg").unwrap();
        assert_eq!(result, "pdf2svg");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDTIKZ_TEST_MISSING");
        }
        let err = expand_env("${MDTIKZ_TEST_MISSING}", "tikz.latex").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in tikz.latex: ${MDTIKZ_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(expand_env("$HOME/bin/latex", "tikz.latex").unwrap(), "$HOME/bin/latex");
    }

    #[test]
    fn test_expand_program_tilde() {
        let expanded = expand_program("~/bin/lualatex", "tikz.latex").unwrap();
        assert!(expanded.ends_with("/bin/lualatex"));
        assert_eq!(expand_program("lualatex", "tikz.latex").unwrap(), "lualatex");
    }
}
