use farmcast_core::{Config, ProviderId};
use inquire::{Confirm, Password, Text};

/// Interactive configuration for a weather provider or the assistant.
pub fn run(target: &str) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if target.eq_ignore_ascii_case("assistant") {
        configure_assistant(&mut config)?;
    } else {
        configure_provider(&mut config, ProviderId::try_from(target)?)?;
    }

    let mut prompt = Text::new("Default city (leave empty for none):");
    if let Some(city) = config.dashboard.default_city.as_deref() {
        prompt = prompt.with_default(city);
    }
    let city = prompt.prompt()?;
    config.dashboard.default_city = Some(city.trim().to_string()).filter(|c| !c.is_empty());

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn configure_provider(config: &mut Config, id: ProviderId) -> anyhow::Result<()> {
    let replace = !config.is_provider_configured(id) || {
        let question = format!("{id} already has an API key. Replace it?");
        Confirm::new(&question).with_default(false).prompt()?
    };

    if replace {
        let message = format!("{id} API key:");
        let key = Password::new(&message).without_confirmation().prompt()?;
        config.upsert_provider_api_key(id, key.trim().to_string());
    }

    if config.default_provider_id().ok() != Some(id) {
        let question = format!("Make {id} the default provider?");
        if Confirm::new(&question).with_default(false).prompt()? {
            config.set_default_provider(id);
        }
    }
    Ok(())
}

fn configure_assistant(config: &mut Config) -> anyhow::Result<()> {
    let key = Password::new("Assistant API key (OpenAI-compatible):")
        .without_confirmation()
        .prompt()?;
    let base_url = Text::new("API base URL:").with_default(&config.assistant.base_url).prompt()?;
    let model = Text::new("Chat model:").with_default(&config.assistant.model).prompt()?;

    config.assistant.api_key = Some(key.trim().to_string()).filter(|k| !k.is_empty());
    config.assistant.base_url = base_url.trim().to_string();
    config.assistant.model = model.trim().to_string();
    Ok(())
}
