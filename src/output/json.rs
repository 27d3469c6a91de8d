use crate::bundle::ContextBundle;
use std::error::Error;

pub fn render(bundle: &ContextBundle) -> Result<String, Box<dyn Error>> {
    Ok(serde_json::to_string_pretty(bundle)?)
}
