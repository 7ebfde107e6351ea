use prism_engine::views::DiffRow;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::DiffArgs;
use crate::commands::link::open;
use crate::context::AppContext;
use crate::output::output_rows;

/// Handle `prism diff`: attribute-by-attribute comparison of two entities.
pub async fn handle(args: &DiffArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut engine = open(ctx).await?;
    let panel = engine.open_diff(args.a, args.b).await?;
    let rows = panel.rows();
    output_rows(
        &panel.diff,
        &["attribute", "class", "a", "b", "sync"],
        &table_rows(&rows),
        flags.format,
    )
}

fn table_rows(rows: &[DiffRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                row.slug.clone(),
                row.class.to_string(),
                row.value_a.clone(),
                row.value_b.clone(),
                if row.eligible { "yes" } else { "" }.to_string(),
            ]
        })
        .collect()
}
