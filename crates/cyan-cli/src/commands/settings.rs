//! Settings commands.

use crate::{SetIntentArgs, SetProfileArgs, SettingsCommand};
use anyhow::{Context, Result, bail};
use cyan_canvas::Settings;
use cyan_core::Colorspace;
use cyan_icc::ColorProfile;
use std::path::PathBuf;

/// Runs a `settings` subcommand.
pub fn run(cmd: SettingsCommand, mut settings: Settings, path: Option<PathBuf>) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            show(&settings, path.as_deref());
            return Ok(());
        }
        SettingsCommand::SetProfile(args) => set_profile(&mut settings, args)?,
        SettingsCommand::SetIntent(args) => set_intent(&mut settings, args),
    }
    let Some(path) = path else {
        bail!("no settings location on this platform, pass --settings");
    };
    settings
        .save(&path)
        .with_context(|| format!("Failed to save settings: {}", path.display()))?;
    println!("saved {}", path.display());
    Ok(())
}

fn show(settings: &Settings, path: Option<&std::path::Path>) {
    if let Some(path) = path {
        println!("{}", path.display());
    }
    for cs in Colorspace::ALL {
        let value = settings
            .color
            .profile_path(cs)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".into());
        println!("  {:<13} {}", format!("{}_profile", cs.name()), value);
    }
    println!("  {:<13} {} ({})", "intent", settings.color.intent.code(), settings.color.intent);
    println!("  {:<13} {}", "blackpoint", settings.color.blackpoint);
    println!("  {:<13} {} GiB", "memory_limit", settings.engine.memory_limit);
}

fn set_profile(settings: &mut Settings, args: SetProfileArgs) -> Result<()> {
    if let Some(path) = &args.path {
        let profile = ColorProfile::from_file(path)
            .with_context(|| format!("Failed to load profile: {}", path.display()))?;
        if !profile.matches(args.colorspace) {
            bail!(
                "{} is a {} profile, not {}",
                path.display(),
                profile.info().colorspace,
                args.colorspace
            );
        }
    }
    settings.color.set_profile_path(args.colorspace, args.path);
    Ok(())
}

fn set_intent(settings: &mut Settings, args: SetIntentArgs) {
    settings.color.intent = args.intent;
    if let Some(bp) = args.blackpoint {
        settings.color.blackpoint = bp;
    }
}
