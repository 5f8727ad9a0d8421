//! Catalog command - families, categories and sub-categories.

use tokio_util::sync::CancellationToken;

use common::{AppConfig, AppError, AppResult};
use domain::{CatalogLevel, NewCatalogNode};

use super::{editor_name, print_json, Context};
use crate::cli::{CatalogAction, CatalogArgs};

pub async fn execute(args: CatalogArgs, config: AppConfig, cancel: &CancellationToken) -> AppResult<()> {
    let ctx = Context::open(config).await?;
    let result = run(&ctx, args, cancel).await;
    ctx.finish().await;
    result
}

async fn run(ctx: &Context, args: CatalogArgs, cancel: &CancellationToken) -> AppResult<()> {
    let admin = ctx.sign_in_admin(&args.admin, cancel).await?;
    let user = editor_name(&admin);
    let level = CatalogLevel::from(args.level);
    let catalog = ctx.admin.catalog(level);

    match args.action {
        CatalogAction::List { parent: None } => print_json(&catalog.get_all(cancel).await?),
        CatalogAction::List { parent } => {
            print_json(&catalog.get_scope(parent.as_deref(), cancel).await?)
        }
        CatalogAction::Add {
            name,
            family,
            category,
        } => {
            let node = new_node(level, name, user, family, category)?;
            let created = catalog.add(node, cancel).await?;
            tracing::info!(id = %created.id, index = created.index, "Added {}", level);
            print_json(&created)
        }
        CatalogAction::Rename { id, name } => {
            print_json(&catalog.rename(&id, &name, &user, cancel).await?)
        }
        CatalogAction::Delete { id } => print_json(&catalog.delete(&id, &user, cancel).await?),
        CatalogAction::Reorder { from, to, parent } => {
            print_json(&catalog.reorder(parent.as_deref(), to, from, &user, cancel).await?)
        }
    }
}

fn new_node(
    level: CatalogLevel,
    name: String,
    user: String,
    family: Option<String>,
    category: Option<String>,
) -> AppResult<NewCatalogNode> {
    match (level, family, category) {
        (CatalogLevel::Family, None, None) => Ok(NewCatalogNode::family(name, user)),
        (CatalogLevel::Category, Some(family), None) => {
            Ok(NewCatalogNode::category(name, user, family))
        }
        (CatalogLevel::SubCategory, Some(family), Some(category)) => {
            Ok(NewCatalogNode::sub_category(name, user, family, category))
        }
        (level, _, _) => Err(AppError::WrongInput(format!(
            "a {} takes {}",
            level,
            match level {
                CatalogLevel::Family => "no parent",
                CatalogLevel::Category => "--family only",
                CatalogLevel::SubCategory => "--family and --category",
            }
        ))),
    }
}
