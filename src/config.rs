use serde::{Deserialize, Serialize};

/// Resource limits for one [`crate::Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Deepest nesting of procedure calls before `execstackoverflow`.
    pub max_call_depth: usize,
    /// Largest operand stack before `stackoverflow`.
    pub max_operand_stack: usize,
    /// Largest dictionary stack, systemdict and userdict included.
    pub max_dictionary_stack: usize,
    /// Most elements `array`, `string` and `dict` may ask for before `limitcheck`.
    pub max_composite_len: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 10_000,
            max_operand_stack: 500_000,
            max_dictionary_stack: 250,
            max_composite_len: 1_000_000,
        }
    }
}

impl InterpreterConfig {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() -> anyhow::Result<()> {
        let config = InterpreterConfig::from_json(r#"{ "max_call_depth": 64 }"#)?;
        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.max_operand_stack, InterpreterConfig::default().max_operand_stack);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(InterpreterConfig::from_json(r#"{ "max_depth": 1 }"#).is_err());
    }
}
