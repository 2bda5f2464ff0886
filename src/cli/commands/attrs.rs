//! attrs command - Print the attributes of a group

use anyhow::{anyhow, Context as _, Result};

use crate::cli::Context;
use crate::core::types::{Location, PathRequirement};
use crate::store::handle::{OpenMode, StoreHandle};

/// Print `name = value` for every attribute of the group at `location`.
pub fn attrs(ctx: &Context, location: &str) -> Result<()> {
    let target = Location::parse(location, PathRequirement::Optional)?;
    let handle = StoreHandle::acquire(&target.file, OpenMode::Read, ctx.policy)
        .with_context(|| format!("Failed to open {}", target.file.display()))?;

    let lines: Vec<String> = handle
        .group(&target.group)
        .ok_or_else(|| anyhow!("No group at {}", target))?
        .attrs()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect();
    handle.close()?;

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
