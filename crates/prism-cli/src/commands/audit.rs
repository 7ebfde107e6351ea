use prism_core::enums::{AuditAction, RecordKind};
use prism_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `prism audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = AuditFilter {
        record_kind: args
            .kind
            .as_deref()
            .map(|raw| parse_enum::<RecordKind>(raw, "record kind"))
            .transpose()?,
        record_id: args.record,
        action: args
            .action
            .as_deref()
            .map(|raw| parse_enum::<AuditAction>(raw, "action"))
            .transpose()?,
        limit: Some(ctx.limit(None, flags)),
    };
    let entries = ctx.service.query_audit(&filter).await?;
    output(&entries, flags.format)
}
