use super::ui::{StyleType, style_text};
use crate::core::ApiProvider;
use crate::sync::RateSync;
use anyhow::Result;

pub fn run(sync: &RateSync, name: Option<&str>) -> Result<()> {
    let store = sync.store();
    if let Some(name) = name {
        let provider: ApiProvider = name.parse()?;
        store.set_provider_selection(provider);
    }

    let selected = store.provider_selection();
    for provider in ApiProvider::ALL {
        let line = format!("{} {}", provider.id(), provider);
        if provider == selected {
            println!("{}", style_text(&format!("* {line}"), StyleType::Highlight));
        } else {
            println!("  {line}");
        }
    }
    Ok(())
}
