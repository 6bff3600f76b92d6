//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", config_path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration, including the derived service settings.
pub fn validate(config: &ClientConfig, credential_override: Option<&Path>) -> ClientResult<()> {
    check(config, credential_override)?;
    println!("Configuration is valid.");
    Ok(())
}

fn check(config: &ClientConfig, credential_override: Option<&Path>) -> ClientResult<()> {
    config
        .to_graph_config(credential_override)
        .validate()
        .map_err(|e| ClientError::Config(e.message().to_string()))?;
    config.slot().map_err(ClientError::Config)?;
    if config.schedule.organizer.trim().is_empty() {
        return Err(ClientError::Config(
            "schedule.organizer must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Show the configuration file and credential record paths.
pub fn path(
    config: &ClientConfig,
    config_path: &Path,
    credential_override: Option<&Path>,
) -> ClientResult<()> {
    let graph = config.to_graph_config(credential_override);
    println!("config: {}", config_path.display());
    println!("credential: {}", graph.credential_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(check(&ClientConfig::default(), None).is_ok());
    }

    #[test]
    fn bad_graph_settings_are_reported() {
        let config: ClientConfig = toml::from_str("[graph]\ntimeout_secs = 0\n").unwrap();
        let err = check(&config, None).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn bad_slot_is_reported() {
        let config: ClientConfig = toml::from_str("[schedule]\nslot_minutes = 45\n").unwrap();
        assert!(
            check(&config, None)
                .unwrap_err()
                .to_string()
                .contains("slot_minutes")
        );
    }

    #[test]
    fn blank_organizer_is_reported() {
        let config: ClientConfig = toml::from_str("[schedule]\norganizer = \" \"\n").unwrap();
        assert!(check(&config, None).is_err());
    }
}
