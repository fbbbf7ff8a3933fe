//! Sample function tools used by the CLI and the test suite.
//!
//! ```
//! use agentrun::tools::builtin::sample_registry;
//!
//! let registry = sample_registry();
//! assert_eq!(registry.len(), 3);
//! ```

use std::sync::Arc;

use crate::error::RunError;
use crate::tools::parameters::ToolParameters;
use crate::tools::resolver::ToolRegistry;
use crate::tools::tool::{FunctionTool, Tool, ToolExecutionContext};

/// `getUserFavoriteCity`: always answers `Seattle, WA`.
pub fn favorite_city_tool() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::new(
        "getUserFavoriteCity",
        "Gets the user's favorite city.",
        ToolParameters::empty(),
        |_args, _ctx: ToolExecutionContext| async move { Ok(serde_json::json!("Seattle, WA")) },
    ))
}

/// `getCityNickname`: nickname of a known city.
pub fn city_nickname_tool() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::new(
        "getCityNickname",
        "Gets the nickname of a city, e.g. 'LA' for 'Los Angeles, CA'.",
        ToolParameters::object()
            .string("location", "The city and state, e.g. San Francisco, CA", true)
            .build(),
        |args, _ctx: ToolExecutionContext| async move {
            let location = args.get_str("location")?;
            let nickname = match location {
                "Seattle, WA" => "The Emerald City",
                "Los Angeles, CA" => "LA",
                "San Francisco, CA" => "The City by the Bay",
                other => {
                    return Err(RunError::ToolExecution {
                        tool_name: "getCityNickname".into(),
                        message: format!("no nickname known for {other}"),
                    })
                }
            };
            Ok(serde_json::json!(nickname))
        },
    ))
}

/// `getWeatherAtLocation`: canned weather report as a JSON object.
pub fn weather_tool() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::new(
        "getWeatherAtLocation",
        "Gets the current weather at a provided location.",
        ToolParameters::object()
            .string("location", "The city and state, e.g. San Francisco, CA", true)
            .string_enum("unit", "Temperature unit", &["c", "f"], false)
            .build(),
        |args, _ctx: ToolExecutionContext| async move {
            let location = args.get_str("location")?;
            let unit = args.get_str_opt("unit").unwrap_or("f");
            let temperature = if unit == "c" { 21 } else { 70 };
            Ok(serde_json::json!({
                "location": location,
                "temperature": temperature,
                "unit": unit,
                "conditions": "partly cloudy",
            }))
        },
    ))
}

pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![favorite_city_tool(), city_nickname_tool(), weather_tool()]
}

/// Registry holding every sample tool.
pub fn sample_registry() -> ToolRegistry {
    all_tools()
        .into_iter()
        .fold(ToolRegistry::new(), |registry, tool| registry.with_tool(tool))
}
