//! Staff command - role records of staff emails.

use tokio_util::sync::CancellationToken;

use common::{AppConfig, AppResult};

use super::{print_json, Context};
use crate::cli::{StaffAction, StaffArgs};

pub async fn execute(args: StaffArgs, config: AppConfig, cancel: &CancellationToken) -> AppResult<()> {
    let ctx = Context::open(config).await?;
    let result = run(&ctx, args, cancel).await;
    ctx.finish().await;
    result
}

async fn run(ctx: &Context, args: StaffArgs, cancel: &CancellationToken) -> AppResult<()> {
    ctx.sign_in_admin(&args.admin, cancel).await?;
    let staff = &ctx.admin.staff;

    match args.action {
        StaffAction::List => print_json(&staff.get_all(cancel).await?),
        StaffAction::Add { email, role } => print_json(&staff.add(&email, role, cancel).await?),
        StaffAction::Role { id, role } => print_json(&staff.edit_role(&id, role, cancel).await?),
        StaffAction::Email { id, email } => {
            print_json(&staff.edit_email(&id, &email, cancel).await?)
        }
        StaffAction::Disable { id } => print_json(&staff.disable(&id, cancel).await?),
        StaffAction::Enable { id } => print_json(&staff.enable(&id, cancel).await?),
    }
}
