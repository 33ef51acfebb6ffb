//! Capabilities the voice model may invoke on the page.
//!
//! There is exactly one: `navigateSection`, which scrolls a page section into
//! view. The argument schema publishes the fixed section domain; whether the
//! section really exists is decided at runtime by the host viewport.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use super::base::{FunctionCallRequest, SectionNavigator};
use super::messages::ToolDef;

/// Name of the navigation capability.
pub const NAVIGATE_SECTION: &str = "navigateSection";

/// Page sections the navigation capability may target.
pub const SECTIONS: [&str; 7] = [
    "info",
    "announcements",
    "gallery",
    "food",
    "location",
    "program",
    "goods",
];

/// Tool declaration sent in `session.update`.
pub fn navigate_section_tool() -> ToolDef {
    ToolDef {
        tool_type: "function".to_string(),
        name: NAVIGATE_SECTION.to_string(),
        description: Some("Scroll page to a specific section".to_string()),
        parameters: Some(json!({
            "type": "object",
            "properties": {
                "section": {
                    "type": "string",
                    "enum": SECTIONS,
                    "description": "Identifier of the page section to show"
                }
            },
            "required": ["section"]
        })),
    }
}

#[derive(Debug, Deserialize)]
struct NavigateArgs {
    #[serde(default)]
    section: Option<String>,
}

/// Result reported back to the model for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the capability succeeded
    pub success: bool,
    /// Section that was shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl ToolOutput {
    fn failure() -> Self {
        Self {
            success: false,
            section: None,
        }
    }
}

/// Routes tool calls from the model to local effects.
#[derive(Clone)]
pub struct ToolDispatcher {
    navigator: Arc<dyn SectionNavigator>,
}

impl ToolDispatcher {
    /// Create a dispatcher backed by the given viewport.
    pub fn new(navigator: Arc<dyn SectionNavigator>) -> Self {
        Self { navigator }
    }

    /// Execute one call.
    ///
    /// Returns `None` for capabilities this dispatcher does not know; the
    /// caller must then send nothing back.
    pub fn dispatch(&self, call: &FunctionCallRequest) -> Option<ToolOutput> {
        match call.name.as_str() {
            NAVIGATE_SECTION => Some(self.navigate(call)),
            other => {
                warn!(call_id = %call.call_id, name = %other, "Ignoring unknown tool call");
                None
            }
        }
    }

    fn navigate(&self, call: &FunctionCallRequest) -> ToolOutput {
        let section = match serde_json::from_str::<NavigateArgs>(&call.arguments) {
            Ok(NavigateArgs {
                section: Some(section),
            }) if !section.trim().is_empty() => section.trim().to_string(),
            Ok(_) => {
                warn!(call_id = %call.call_id, "navigateSection called without a section");
                return ToolOutput::failure();
            }
            Err(e) => {
                warn!(call_id = %call.call_id, error = %e, "Malformed navigateSection arguments");
                return ToolOutput::failure();
            }
        };

        if self.navigator.scroll_to(&section) {
            debug!(call_id = %call.call_id, section = %section, "Scrolled to section");
            ToolOutput {
                success: true,
                section: Some(section),
            }
        } else {
            warn!(call_id = %call.call_id, section = %section, "Section not found on page");
            ToolOutput::failure()
        }
    }
}
