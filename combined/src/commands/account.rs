//! Account commands: sign-up, email verification and the admin bootstrap.
//!
//! These run without the admin gate. `bootstrap-admin` writes the grant
//! document directly, so it is the way to create the first administrator of
//! a fresh database.

use tokio_util::sync::CancellationToken;

use common::{AppConfig, AppResult};
use identity_lib::IdentityProvider;

use super::{print_json, Context};
use crate::cli::{BootstrapArgs, SignupArgs, VerifyArgs};

pub async fn signup(args: SignupArgs, config: AppConfig, cancel: &CancellationToken) -> AppResult<()> {
    let ctx = Context::open(config).await?;
    let result = signup_inner(&ctx, &args, cancel).await;
    ctx.finish().await;
    result
}

async fn signup_inner(ctx: &Context, args: &SignupArgs, cancel: &CancellationToken) -> AppResult<()> {
    let identity = common::with_cancel(
        cancel,
        ctx.identity.create_user_with_password(&args.email, &args.password),
    )
    .await?;
    let code = ctx.identity.send_email_verification(&identity).await?;
    tracing::info!(uid = %identity.uid, "Account created");

    print_json(&identity)?;
    println!("verification code: {}", code);
    Ok(())
}

pub async fn verify(args: VerifyArgs, config: AppConfig) -> AppResult<()> {
    let ctx = Context::open(config).await?;
    let result = ctx.identity.apply_email_verification(&args.code).await;
    ctx.finish().await;
    result?;
    tracing::info!("Email verified");
    Ok(())
}

pub async fn bootstrap_admin(
    args: BootstrapArgs,
    config: AppConfig,
    cancel: &CancellationToken,
) -> AppResult<()> {
    let ctx = Context::open(config).await?;
    let result = ctx.admin.staff.bootstrap_admin(&args.email, cancel).await;
    // The role worker sets the claim while finishing
    ctx.finish().await;

    let grant = result?;
    tracing::info!(email = %grant.email, "Admin role granted");
    print_json(&grant)
}
