//! CLI argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};

use domain::{CatalogLevel, StaffRole};

/// Staff Admin - manage staff roles and the product catalog
#[derive(Parser, Debug)]
#[command(name = "staff-admin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database URL, overrides the configured store
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run database migrations
    Migrate(MigrateArgs),

    /// Create an account with email and password
    Signup(SignupArgs),

    /// Confirm an email address with a verification code
    Verify(VerifyArgs),

    /// Grant the admin role to an account
    BootstrapAdmin(BootstrapArgs),

    /// Manage staff roles
    Staff(StaffArgs),

    /// Manage the catalog taxonomy
    Catalog(CatalogArgs),

    /// Look up countries, states and cities
    Geo(GeoArgs),
}

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Drop all tables and rerun every migration
    Fresh,
}

#[derive(Parser, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "SIGNUP_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    pub code: String,
}

#[derive(Parser, Debug)]
pub struct BootstrapArgs {
    #[arg(long)]
    pub email: String,
}

/// Credentials of the administrator running a guarded command
#[derive(Args, Debug, Clone)]
pub struct AdminCredentials {
    #[arg(long = "as", env = "ADMIN_EMAIL")]
    pub email: String,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct StaffArgs {
    #[command(flatten)]
    pub admin: AdminCredentials,

    #[command(subcommand)]
    pub action: StaffAction,
}

#[derive(Subcommand, Debug)]
pub enum StaffAction {
    /// List every staff role record
    List,
    /// Assign a role to a new staff email
    Add { email: String, role: StaffRole },
    /// Change the role of a record
    Role { id: String, role: StaffRole },
    /// Change the email of a record
    Email { id: String, email: String },
    Disable { id: String },
    Enable { id: String },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Level {
    Family,
    Category,
    SubCategory,
}

impl From<Level> for CatalogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Family => CatalogLevel::Family,
            Level::Category => CatalogLevel::Category,
            Level::SubCategory => CatalogLevel::SubCategory,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub admin: AdminCredentials,

    #[arg(value_enum)]
    pub level: Level,

    #[command(subcommand)]
    pub action: CatalogAction,
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// List every node, or only the live nodes of one scope with --parent
    List {
        #[arg(long)]
        parent: Option<String>,
    },
    /// Add a node at the end of its scope
    Add {
        name: String,
        #[arg(long)]
        family: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Rename { id: String, name: String },
    Delete { id: String },
    /// Move the node at position FROM of a scope to position TO
    Reorder {
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        #[arg(long)]
        parent: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct GeoArgs {
    #[command(subcommand)]
    pub action: GeoAction,
}

#[derive(Subcommand, Debug)]
pub enum GeoAction {
    Countries,
    States { country: String },
    Cities { country: String, state: String },
}
