//! check command - Ask the output guard whether to skip

use anyhow::Result;

use crate::cli::Context;
use crate::core::types::{Location, PathRequirement};
use crate::persist::guard::OutputGuard;

/// Print `skip` or `proceed` for `location`.
pub fn check(ctx: &Context, location: &str, overwrite: bool) -> Result<()> {
    let target = Location::parse(location, PathRequirement::Required)?;
    let overwrite = overwrite || ctx.config.overwrite();

    let guard = OutputGuard::new(&ctx.logger, ctx.policy);
    if guard.check_output(&target, overwrite)? {
        println!("skip");
    } else {
        println!("proceed");
    }
    Ok(())
}
