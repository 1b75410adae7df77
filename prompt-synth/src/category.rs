use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::errors::PromptError;

/// Kind of test requested from the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestCategory {
    #[default]
    Unit,
    Integration,
    Fuzz,
    Mutation,
    Property,
}

impl TestCategory {
    pub const ALL: [TestCategory; 5] = [
        TestCategory::Unit,
        TestCategory::Integration,
        TestCategory::Fuzz,
        TestCategory::Mutation,
        TestCategory::Property,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestCategory::Unit => "unit",
            TestCategory::Integration => "integration",
            TestCategory::Fuzz => "fuzz",
            TestCategory::Mutation => "mutation",
            TestCategory::Property => "property",
        }
    }

    /// The canned instruction sentence for `function_name`.
    pub fn instruction(self, function_name: &str) -> String {
        match self {
            TestCategory::Unit => format!(
                "Write unit tests using pytest for this function/method: {function_name}. \
                 Cover edge cases and important behaviors."
            ),
            TestCategory::Integration => format!(
                "Write integration tests using pytest for this function/method: {function_name} \
                 exercising it together with the code it depends on."
            ),
            TestCategory::Fuzz => format!(
                "Write fuzz tests for this function/method: {function_name} \
                 using Hypothesis for diverse inputs."
            ),
            TestCategory::Mutation => format!(
                "Write mutation-robust tests for this function/method: {function_name} \
                 ensuring key logic correctness."
            ),
            TestCategory::Property => format!(
                "Write property-based tests for this function/method: {function_name} \
                 describing invariants."
            ),
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestCategory {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        TestCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .ok_or_else(|| PromptError::UnknownCategory(s.to_string()))
    }
}

/// Instruction for a free-form category label. Unknown labels are logged and
/// yield `None`.
pub fn instruction_for_label(label: &str, function_name: &str) -> Option<String> {
    match label.parse::<TestCategory>() {
        Ok(category) => Some(category.instruction(function_name)),
        Err(err) => {
            warn!("prompt: {err}, no instruction appended for {function_name}");
            None
        }
    }
}
