//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token consumption statistics for a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageDetails {
    #[serde(
        rename = "inputTokenCount",
        default,
        skip_serializing_if = "is_zero"
    )]
    pub input_tokens: u32,
    #[serde(
        rename = "outputTokenCount",
        default,
        skip_serializing_if = "is_zero"
    )]
    pub output_tokens: u32,
    #[serde(
        rename = "totalTokenCount",
        default,
        skip_serializing_if = "is_zero"
    )]
    pub total_tokens: u32,
}

impl UsageDetails {
    pub fn new(input_tokens: u32, output_tokens: u32, total_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// True when no tokens have been recorded.
    pub fn is_zero(&self) -> bool {
        self.total_tokens == 0
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_serializes_with_wire_field_names() {
        let usage = UsageDetails::new(5, 3, 8);
        let encoded = serde_json::to_value(usage).expect("serialize should work");
        assert_eq!(encoded["inputTokenCount"], 5);
        assert_eq!(encoded["outputTokenCount"], 3);
        assert_eq!(encoded["totalTokenCount"], 8);
    }

    #[test]
    fn zero_fields_are_omitted_from_the_wire_form() {
        let encoded =
            serde_json::to_string(&UsageDetails::default()).expect("serialize should work");
        assert_eq!(encoded, "{}");
    }
}
