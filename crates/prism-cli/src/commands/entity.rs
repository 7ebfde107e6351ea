use prism_core::entities::{AttributeValue, NewEntity};
use prism_core::responses::EntityDetailResponse;
use prism_db::updates::entity::EntityUpdateBuilder;
use prism_engine::EntityBrowser;
use prism_engine::views::EntityRow;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::EntityCommands;
use crate::commands::shared::parse::parse_attr;
use crate::context::AppContext;
use crate::output::{output, output_rows};

#[derive(Debug, Serialize)]
struct EntityListResponse {
    type_slug: Option<String>,
    parent_id: Option<i64>,
    columns: Vec<String>,
    rows: Vec<EntityRow>,
}

/// Handle `prism entity`.
pub async fn handle(
    action: &EntityCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        EntityCommands::Create {
            type_slug,
            name,
            parent,
            attrs,
        } => {
            let mut new = NewEntity::new(ctx.project_id(flags)?, type_slug, name);
            if let Some(parent) = parent {
                new = new.under(*parent);
            }
            for raw in attrs {
                let (slug, value) = parse_attr(raw)?;
                new = new.attribute(slug, AttributeValue::manual(value));
            }
            let entity = ctx.service.create_entity(&new).await?;
            output(&entity, flags.format)
        }
        EntityCommands::List {
            type_slug,
            parent,
            search,
        } => list(ctx, flags, type_slug.as_deref(), *parent, search.as_deref()).await,
        EntityCommands::Show { id } => {
            let entity = ctx.service.get_entity(*id).await?;
            let children = ctx.service.list_children(*id).await?;
            output(&EntityDetailResponse { entity, children }, flags.format)
        }
        EntityCommands::Update {
            id,
            name,
            attrs,
            clear,
        } => {
            let mut builder = EntityUpdateBuilder::new();
            if let Some(name) = name {
                builder = builder.name(name);
            }
            for raw in attrs {
                let (slug, value) = parse_attr(raw)?;
                builder = builder.set(slug, AttributeValue::manual(value));
            }
            for slug in clear {
                builder = builder.clear(slug);
            }
            let update = builder.build();
            if update.is_empty() {
                anyhow::bail!("nothing to update; pass --name, --attr or --clear");
            }
            let entity = ctx.service.update_entity(*id, &update).await?;
            output(&entity, flags.format)
        }
        EntityCommands::Star { ids } => {
            output(&ctx.service.set_starred(ids, true).await?, flags.format)
        }
        EntityCommands::Unstar { ids } => {
            output(&ctx.service.set_starred(ids, false).await?, flags.format)
        }
        EntityCommands::Delete { ids } => {
            output(&ctx.service.delete_entities(ids).await?, flags.format)
        }
        EntityCommands::Counts => {
            let counts = ctx.service.count_by_type(ctx.project_id(flags)?).await?;
            output(&counts, flags.format)
        }
    }
}

async fn list(
    ctx: &AppContext,
    flags: &GlobalFlags,
    type_slug: Option<&str>,
    parent: Option<i64>,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let mut browser = EntityBrowser::open(ctx.service.clone(), ctx.project_id(flags)?).await?;
    browser.set_limit(Some(ctx.limit(None, flags)));

    match parent {
        Some(parent_id) => {
            let parent = ctx.service.get_entity(parent_id).await?;
            browser
                .drill_down(parent.id, &parent.name, &parent.type_slug, type_slug)
                .await?;
        }
        None => {
            if let Some(type_slug) = type_slug {
                browser.set_type_filter(type_slug).await?;
            }
        }
    }
    if let Some(term) = search {
        browser.set_search(term).await?;
    }

    let columns: Vec<String> = browser.columns().iter().map(|c| c.name.clone()).collect();
    let rows = browser.rows();

    let mut headers = vec!["id", "name"];
    headers.extend(columns.iter().map(String::as_str));
    headers.extend(["children", "evidence", "starred"]);
    let table: Vec<Vec<String>> = rows.iter().map(table_row).collect();

    output_rows(
        &EntityListResponse {
            type_slug: browser.active_type().map(str::to_string),
            parent_id: browser.parent_id(),
            columns: columns.clone(),
            rows,
        },
        &headers,
        &table,
        flags.format,
    )
}

fn table_row(row: &EntityRow) -> Vec<String> {
    let mut cells = Vec::with_capacity(row.cells.len() + 5);
    cells.push(row.id.to_string());
    cells.push(row.name.clone());
    cells.extend(row.cells.iter().cloned());
    cells.push(row.child_count.to_string());
    cells.push(row.evidence_count.to_string());
    cells.push(if row.starred { "*" } else { "" }.to_string());
    cells
}
