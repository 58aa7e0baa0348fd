use std::sync::Arc;

use config_demo::{bootstrap, Report};
use sprig_core::ApplicationResult;

fn main() -> ApplicationResult<()> {
    let context = bootstrap(Arc::new(Report::stdout()))?;
    context.shutdown()?;
    Ok(())
}
