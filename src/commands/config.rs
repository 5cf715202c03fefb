//! Config command handler - show and edit the configuration file

use crate::cli::{ConfigArgs, ConfigOperation, OutputFormat};
use crate::commands::CommandContext;
use crate::config::AgentConfig;
use crate::error::{FontError, Result};

/// Run the config command
pub fn run_config(args: &ConfigArgs, ctx: &CommandContext) -> Result<String> {
    match &args.operation {
        ConfigOperation::Show => show(ctx),
        ConfigOperation::Get { key } => get(ctx, key),
        ConfigOperation::Set { key, value } => set(ctx, key, value),
        ConfigOperation::Reset => reset(ctx),
    }
}

fn show(ctx: &CommandContext) -> Result<String> {
    let config = ctx.load_config()?;
    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config).map_err(|e| {
                FontError::ConfigError {
                    message: format!("Failed to serialize config: {}", e),
                }
            })?;
            Ok(format!("{}\n", json))
        }
        OutputFormat::Text => Ok(format!(
            "{}\nconfig_file: {}\n",
            config.display(),
            ctx.config_file().display()
        )),
    }
}

fn get(ctx: &CommandContext, key: &str) -> Result<String> {
    if !AgentConfig::is_known_key(key) {
        return Err(FontError::ConfigError {
            message: format!("Unknown configuration key: {}", key),
        });
    }
    let config = ctx.load_config()?;
    // Unset optional keys print nothing
    Ok(config
        .get(key)
        .map(|value| format!("{}\n", value))
        .unwrap_or_default())
}

fn set(ctx: &CommandContext, key: &str, value: &str) -> Result<String> {
    let path = ctx.config_file();
    let mut config = ctx.load_config()?;
    config.set(key, value)?;
    config.save_to(&path)?;
    Ok(format!("Set {} = {}\n", key, value))
}

fn reset(ctx: &CommandContext) -> Result<String> {
    let path = ctx.config_file();
    let mut config = ctx.load_config()?;
    config.reset();
    config.save_to(&path)?;
    Ok(format!("Configuration reset to defaults ({})\n", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ctx_in(dir: &std::path::Path) -> CommandContext {
        CommandContext::new(OutputFormat::Text, Some(dir.join("config.toml")))
    }

    #[test]
    fn test_set_then_get() {
        let temp = tempdir().unwrap();
        let ctx = ctx_in(temp.path());

        let set_args = ConfigArgs {
            operation: ConfigOperation::Set {
                key: "server.port".to_string(),
                value: "9100".to_string(),
            },
        };
        run_config(&set_args, &ctx).unwrap();

        let get_args = ConfigArgs {
            operation: ConfigOperation::Get {
                key: "server.port".to_string(),
            },
        };
        assert_eq!(run_config(&get_args, &ctx).unwrap(), "9100\n");
    }

    #[test]
    fn test_get_unset_and_unknown() {
        let temp = tempdir().unwrap();
        let ctx = ctx_in(temp.path());

        let unset = ConfigArgs {
            operation: ConfigOperation::Get {
                key: "status.file".to_string(),
            },
        };
        assert_eq!(run_config(&unset, &ctx).unwrap(), "");

        let unknown = ConfigArgs {
            operation: ConfigOperation::Get {
                key: "server.colour".to_string(),
            },
        };
        assert!(run_config(&unknown, &ctx).is_err());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let temp = tempdir().unwrap();
        let ctx = ctx_in(temp.path());
        let mut config = AgentConfig::default();
        config.server.port = 1;
        config.save_to(&ctx.config_file()).unwrap();

        run_config(
            &ConfigArgs {
                operation: ConfigOperation::Reset,
            },
            &ctx,
        )
        .unwrap();
        assert_eq!(ctx.load_config().unwrap().server.port, 42135);
    }

    #[test]
    fn test_show_json() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(OutputFormat::Json, Some(temp.path().join("config.toml")));
        let output = run_config(
            &ConfigArgs {
                operation: ConfigOperation::Show,
            },
            &ctx,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["server"]["path"], "/ws");
    }
}
