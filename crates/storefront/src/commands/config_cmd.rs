//! Config subcommand handlers.

use storefront_config::{Profile, Settings};

use crate::cli::{ConfigArgs, ConfigCommand, ConfigInitArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Copy of the settings safe to print: plaintext tokens are masked.
fn redacted(settings: &Settings) -> Settings {
    let mut settings = settings.clone();
    for profile in settings.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(REDACTED.into());
        }
    }
    settings
}

fn init(args: ConfigInitArgs, mut settings: Settings) -> Result<Settings, CliError> {
    if settings.profiles.contains_key(&args.name) && !args.force {
        return Err(CliError::ProfileExists { name: args.name });
    }

    let profile = Profile {
        store_url: args.store_url,
        tenant: args.tenant,
        token_env: args.token_env,
        ..Profile::default()
    };
    // Reject bad input before anything is written
    storefront_config::store_url(&profile)?;
    storefront_config::profile_to_storefront_settings(&profile, &settings)?;

    if settings.profiles.is_empty() {
        settings.default_profile = Some(args.name.clone());
    }
    settings.profiles.insert(args.name, profile);
    Ok(settings)
}

fn set_profile(name: String, mut settings: Settings) -> Result<Settings, CliError> {
    if !settings.profiles.contains_key(&name) {
        let available: Vec<&str> = settings.profiles.keys().map(String::as_str).collect();
        return Err(CliError::ProfileNotFound {
            name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }
    settings.default_profile = Some(name);
    Ok(settings)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init_args) => {
            let name = init_args.name.clone();
            let settings = init(init_args, config::load_settings()?)?;
            let path = storefront_config::save_settings(&settings)?;
            if !global.quiet {
                eprintln!("✓ Profile '{name}' written to {}", path.display());
                eprintln!("  Test it: storefront show theme -p {name}");
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let settings = redacted(&config::load_settings()?);
            let out = output::render_single(
                global.output,
                &settings,
                |s| toml::to_string_pretty(s).map_err(|e| CliError::Render(e.to_string())),
                |s| s.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &storefront_config::settings_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::SetProfile { name } => {
            let settings = set_profile(name.clone(), config::load_settings()?)?;
            storefront_config::save_settings(&settings)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}
