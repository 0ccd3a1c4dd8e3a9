//! CLI argument parsing for the enrollment client.
//!
//! One command per form affordance; each run restores the stored draft,
//! applies a single action, and flushes the draft back before exiting.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "rsbsa",
    version,
    about = "RSBSA enrollment form client",
    after_help = "Examples:\n  rsbsa init --api-url https://rsbsa.example.gov.ph/api\n  rsbsa login --user-id 42 --role beneficiary --token <TOKEN>\n  rsbsa set beneficiaryDetails barangay Taboc\n  rsbsa category farmer\n  rsbsa parcel add\n  rsbsa commodity set 0 0 commodity_id 3\n  rsbsa validate\n  rsbsa submit --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Workspace root holding config, storage slots, and history
    #[arg(long, value_name = "DIR", global = true)]
    pub workspace: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config into the workspace
    Init(InitArgs),
    /// Store an auth token and user profile snapshot
    Login(LoginArgs),
    /// Forget the stored auth session
    Logout,
    /// Set one field inside a form section
    Set(SetArgs),
    /// Select the livelihood category (code 1-4 or name)
    Category(CategoryArgs),
    /// Add, edit, or remove farm parcels
    #[command(subcommand)]
    Parcel(ParcelCommand),
    /// Add, edit, or remove commodities inside a parcel
    #[command(subcommand)]
    Commodity(CommodityCommand),
    /// Show or move the current form step
    Step(StepArgs),
    /// Run validation and list errors
    Validate(OutputArgs),
    /// Summarize the draft, step, and completion
    Status(StatusArgs),
    /// Load an existing enrollment and the application status
    Load(RemoteArgs),
    /// Validate and submit the enrollment
    Submit(RemoteArgs),
    /// Save the draft to the backend without validation
    SaveDraft(RemoteArgs),
    /// Discard the draft and start over
    Reset,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Backend base URL, e.g. https://host/api
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Overwrite an existing config.json
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, value_name = "ID")]
    pub user_id: String,

    /// admin, coordinator, or beneficiary
    #[arg(long, value_name = "ROLE")]
    pub role: String,

    #[arg(long, value_name = "NAME", default_value = "")]
    pub name: String,

    /// Bearer token issued by the backend
    #[arg(long, value_name = "TOKEN")]
    pub token: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// beneficiaryDetails, farmProfile, farmerActivities, fisherfolkActivities,
    /// farmworkerActivities, or agriYouthActivities
    pub section: String,
    pub field: String,
    /// Text, true/false, a number, or `null`
    pub value: String,
}

#[derive(Args, Debug)]
pub struct CategoryArgs {
    /// 1/farmer, 2/farmworker, 3/fisherfolk, 4/agri_youth
    pub category: String,
}

#[derive(Subcommand, Debug)]
pub enum ParcelCommand {
    /// Append an empty parcel
    Add,
    /// Remove the parcel at INDEX
    Remove { index: usize },
    /// Set one field on the parcel at INDEX
    Set {
        index: usize,
        field: String,
        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommodityCommand {
    /// Append an empty commodity to PARCEL
    Add { parcel: usize },
    /// Remove commodity INDEX from PARCEL
    Remove { parcel: usize, index: usize },
    /// Set one field on commodity INDEX of PARCEL
    Set {
        parcel: usize,
        index: usize,
        field: String,
        value: String,
    },
}

#[derive(Args, Debug)]
pub struct StepArgs {
    /// `next`, `prev`, or a step number; omit to show the current step
    pub target: Option<String>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also ask the backend for the application status
    #[arg(long)]
    pub remote: bool,

    /// Applicant id; defaults to the logged-in user
    #[arg(long, value_name = "ID")]
    pub applicant: Option<String>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Applicant id; defaults to the logged-in user
    #[arg(long, value_name = "ID")]
    pub applicant: Option<String>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
