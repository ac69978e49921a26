/// Expand shell variables and `~` in a path string.
///
/// The input is returned unchanged when expansion fails.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_variable_leaves_input_unchanged() {
        let input = "$AUDTARGET_SURELY_UNDEFINED_VAR/taxonomy.json";
        assert_eq!(expand_env_vars(input), input);
    }
}
