//! Profile catalog commands.

use crate::{ProfilesCommand, ProfilesDescribeArgs, ProfilesEditArgs, ProfilesListArgs};
use anyhow::{Context, Result};
use cyan_icc::{ProfileCatalog, describe_file, edit_profile};
use tracing::debug;

/// Runs a `profiles` subcommand.
pub fn run(cmd: ProfilesCommand) -> Result<()> {
    match cmd {
        ProfilesCommand::List(args) => list(args),
        ProfilesCommand::Describe(args) => describe(args),
        ProfilesCommand::Edit(args) => edit(args),
    }
}

fn list(args: ProfilesListArgs) -> Result<()> {
    let catalog = if args.dir.is_empty() {
        ProfileCatalog::system()
    } else {
        ProfileCatalog::new(args.dir)
    };
    debug!(dirs = ?catalog.dirs(), colorspace = %args.colorspace, "scanning profiles");
    let mut count = 0;
    for entry in catalog.list(args.colorspace) {
        println!("{}\t{}", entry.description, entry.path.display());
        count += 1;
    }
    if count == 0 {
        eprintln!("no {} profiles found", args.colorspace);
    }
    Ok(())
}

fn describe(args: ProfilesDescribeArgs) -> Result<()> {
    for path in &args.input {
        let info = describe_file(path);
        println!("{}", path.display());
        println!("  Description:  {}", info.description);
        println!("  Manufacturer: {}", info.manufacturer);
        println!("  Copyright:    {}", info.copyright);
        println!("  Colorspace:   {}", info.colorspace);
    }
    Ok(())
}

fn edit(args: ProfilesEditArgs) -> Result<()> {
    let output = args.output.as_deref().unwrap_or(&args.input);
    edit_profile(
        &args.input,
        output,
        args.description.as_deref(),
        args.copyright.as_deref(),
    )
    .with_context(|| format!("Failed to edit profile: {}", args.input.display()))?;
    println!("wrote {}", output.display());
    Ok(())
}
