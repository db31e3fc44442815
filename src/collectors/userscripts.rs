//! User Scripts Collector
//!
//! # Metrics Produced
//! - `unraid_user_scripts` - Number of configured scripts (0 without the plugin)
//! - `unraid_user_script_info` - One series per script (value is always 1)
//!   - Labels: script

use super::{collect_with_handler, CollectionContext, CollectionResult};

/// Collects the User Scripts plugin inventory
///
/// Series for deleted scripts are dropped on every successful run.
pub async fn collect_userscript_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("userscripts", ctx.client.userscripts().scripts(), |scripts| {
        let m = ctx.metrics;
        m.user_scripts.set(scripts.len() as f64);
        m.user_script_info.reset();
        for script in &scripts {
            m.user_script_info
                .with_label_values(&[script.name.as_str()])
                .set(1);
        }
    })
    .await
}
