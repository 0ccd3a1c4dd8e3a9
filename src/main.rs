use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use rsbsa_enroll::auth::{self, AuthSession, Role, UserProfile};
use rsbsa_enroll::backend::HttpBackend;
use rsbsa_enroll::enrollment::{
    ApplicationStatus, EnrollmentDraft, EnrollmentSession, ErrorMap, LivelihoodCategory, Section,
    SessionOptions, StatusCheck, SubmissionKind, SubmitOutcome, LIVELIHOOD_CATEGORY_FIELD,
};
use rsbsa_enroll::storage::FileSessionStore;
use rsbsa_enroll::workspace::{
    append_history, default_config, load_config_or_default, now_epoch_ms, validate_config,
    with_env_overrides, write_config, ClientConfig, SubmissionRecord, WorkspacePaths,
    API_TOKEN_ENV, HISTORY_SCHEMA_VERSION,
};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{
    CategoryArgs, Command, CommodityCommand, InitArgs, LoginArgs, OutputArgs, ParcelCommand,
    RemoteArgs, RootArgs, SetArgs, StatusArgs, StepArgs,
};

type Session = EnrollmentSession<HttpBackend, FileSessionStore>;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);
    let root = resolve_workspace(args.workspace)?;

    if let Command::Init(init) = args.command {
        return cmd_init(root, init);
    }
    let workspace = Workspace::open(root)?;
    match args.command {
        Command::Init(_) => Ok(()),
        Command::Login(login) => cmd_login(&workspace, login),
        Command::Logout => cmd_logout(&workspace),
        Command::Set(set) => cmd_set(&workspace, set),
        Command::Category(category) => cmd_category(&workspace, category),
        Command::Parcel(parcel) => cmd_parcel(&workspace, parcel),
        Command::Commodity(commodity) => cmd_commodity(&workspace, commodity),
        Command::Step(step) => cmd_step(&workspace, step),
        Command::Validate(output) => cmd_validate(&workspace, output),
        Command::Status(status) => cmd_status(&workspace, status),
        Command::Load(remote) => cmd_load(&workspace, remote),
        Command::Submit(remote) => cmd_submission(&workspace, remote, SubmissionKind::Submit),
        Command::SaveDraft(remote) => {
            cmd_submission(&workspace, remote, SubmissionKind::SaveDraft)
        }
        Command::Reset => cmd_reset(&workspace),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("rsbsa=debug,rsbsa_enroll=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_workspace(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("rsbsa"))
        .ok_or_else(|| anyhow!("cannot determine a data directory; pass --workspace"))
}

/// Config plus paths for one command run.
struct Workspace {
    paths: WorkspacePaths,
    config: ClientConfig,
}

impl Workspace {
    fn open(root: PathBuf) -> Result<Self> {
        let config = load_config_or_default(&root)?;
        let config = with_env_overrides(config, |key| std::env::var(key).ok());
        validate_config(&config).context("invalid client config")?;
        Ok(Self {
            paths: WorkspacePaths::new(root),
            config,
        })
    }

    fn store(&self) -> FileSessionStore {
        FileSessionStore::new(self.paths.slots_dir())
    }

    /// Open a session with the stored draft and step restored.
    fn session(&self) -> Session {
        let mut session = self.unrestored_session();
        let restore = session.restore_draft();
        tracing::debug!(restore = restore.label(), "local draft restore");
        session
    }

    /// Session whose one-time draft restore has not run yet.
    fn unrestored_session(&self) -> Session {
        let store = self.store();
        let stored_auth = auth::load_session(&store);
        let token = auth::resolve_token(stored_auth.as_ref(), std::env::var(API_TOKEN_ENV).ok());
        let backend = HttpBackend::new(
            &self.config.api_base_url,
            Duration::from_secs(self.config.timeout_secs),
            token,
        );
        let options = SessionOptions {
            debounce: Duration::from_millis(self.config.draft_debounce_ms),
            location_defaults: self.config.location_defaults.clone(),
        };
        EnrollmentSession::new(backend, store, options)
    }

    fn applicant(&self, explicit: Option<String>) -> Result<String> {
        if let Some(id) = explicit.filter(|id| !id.trim().is_empty()) {
            return Ok(id);
        }
        auth::load_session(&self.store())
            .map(|session| session.user.user_id)
            .ok_or_else(|| anyhow!("not logged in; run `rsbsa login` or pass --applicant"))
    }
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

fn print_errors(errors: &ErrorMap) {
    for (path, message) in errors {
        println!("  {path}: {message}");
    }
}

fn cmd_init(root: PathBuf, args: InitArgs) -> Result<()> {
    let paths = WorkspacePaths::new(root);
    let config_path = paths.config_path();
    if config_path.is_file() && !args.force {
        bail!(
            "config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }
    let mut config = default_config();
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    validate_config(&config)?;
    write_config(paths.root(), &config)?;
    println!("wrote {}", config_path.display());
    Ok(())
}

fn cmd_login(workspace: &Workspace, args: LoginArgs) -> Result<()> {
    let role: Role = args.role.parse().map_err(|err: String| anyhow!(err))?;
    if args.token.trim().is_empty() {
        bail!("--token must be non-empty");
    }
    let session = AuthSession {
        token: args.token,
        user: UserProfile {
            user_id: args.user_id,
            role,
            name: args.name,
        },
    };
    let mut store = workspace.store();
    auth::save_session(&mut store, &session)?;
    println!("logged in as {} ({})", session.user.user_id, session.user.role);
    Ok(())
}

fn cmd_logout(workspace: &Workspace) -> Result<()> {
    let mut store = workspace.store();
    auth::clear_session(&mut store)?;
    println!("logged out");
    Ok(())
}

/// Current JSON value at `pointer` inside the draft, used to coerce CLI text.
fn current_value(draft: &EnrollmentDraft, pointer: &str) -> Option<Value> {
    serde_json::to_value(draft).ok()?.pointer(pointer).cloned()
}

/// Interpret CLI text according to the type of the field it replaces.
fn coerce_value(current: Option<&Value>, raw: &str) -> Value {
    match current {
        Some(Value::String(_)) => Value::String(raw.to_string()),
        Some(Value::Bool(_)) => parse_bool(raw)
            .map(Value::Bool)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed == "null" {
                return Value::Null;
            }
            serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn cmd_set(workspace: &Workspace, args: SetArgs) -> Result<()> {
    let section: Section = args.section.parse().map_err(|err: String| anyhow!(err))?;
    let mut session = workspace.session();
    let current = current_value(session.draft(), &format!("/{section}/{}", args.field));
    let value = coerce_value(current.as_ref(), &args.value);
    session
        .update_field(section, &args.field, value)
        .with_context(|| format!("set {section}.{}", args.field))?;
    session.flush_draft();
    println!("updated {section}.{}", args.field);
    Ok(())
}

fn cmd_category(workspace: &Workspace, args: CategoryArgs) -> Result<()> {
    let category: LivelihoodCategory =
        args.category.parse().map_err(|err: String| anyhow!(err))?;
    let mut session = workspace.session();
    session
        .set_livelihood_category(category)
        .with_context(|| format!("set {LIVELIHOOD_CATEGORY_FIELD}"))?;
    session.flush_draft();
    let farm_note = if category.requires_farm_data() {
        "farm parcels required"
    } else {
        "no farm parcels required"
    };
    println!("livelihood category: {category} ({farm_note})");
    Ok(())
}

fn cmd_parcel(workspace: &Workspace, command: ParcelCommand) -> Result<()> {
    let mut session = workspace.session();
    match command {
        ParcelCommand::Add => {
            let index = session.add_parcel()?;
            println!("added parcel {index}");
        }
        ParcelCommand::Remove { index } => {
            session.remove_parcel(index)?;
            println!("removed parcel {index}");
        }
        ParcelCommand::Set {
            index,
            field,
            value,
        } => {
            let current = current_value(session.draft(), &format!("/farmParcels/{index}/{field}"));
            let value = coerce_value(current.as_ref(), &value);
            session
                .update_parcel(index, &field, value)
                .with_context(|| format!("set farmParcels.{index}.{field}"))?;
            println!("updated farmParcels.{index}.{field}");
        }
    }
    session.flush_draft();
    Ok(())
}

fn cmd_commodity(workspace: &Workspace, command: CommodityCommand) -> Result<()> {
    let mut session = workspace.session();
    match command {
        CommodityCommand::Add { parcel } => {
            let index = session.add_commodity(parcel)?;
            println!("added commodity {index} to parcel {parcel}");
        }
        CommodityCommand::Remove { parcel, index } => {
            session.remove_commodity(parcel, index)?;
            println!("removed commodity {index} from parcel {parcel}");
        }
        CommodityCommand::Set {
            parcel,
            index,
            field,
            value,
        } => {
            let pointer = format!("/farmParcels/{parcel}/commodities/{index}/{field}");
            let current = current_value(session.draft(), &pointer);
            let value = coerce_value(current.as_ref(), &value);
            session
                .update_commodity(parcel, index, &field, value)
                .with_context(|| format!("set farmParcels.{parcel}.commodities.{index}.{field}"))?;
            println!("updated farmParcels.{parcel}.commodities.{index}.{field}");
        }
    }
    session.flush_draft();
    Ok(())
}

#[derive(Serialize)]
struct StepView {
    step: u8,
    total_steps: u8,
    title: &'static str,
}

fn cmd_step(workspace: &Workspace, args: StepArgs) -> Result<()> {
    let mut session = workspace.session();
    match args.target.as_deref().map(str::trim) {
        None => {}
        Some("next") => {
            session.next_step();
        }
        Some("prev") => {
            session.prev_step();
        }
        Some(raw) => {
            let total = session.navigator().total();
            let step: u8 = raw
                .parse()
                .map_err(|_| anyhow!("step must be next, prev, or 1-{total} (got {raw:?})"))?;
            if !session.go_to_step(step) {
                bail!("step must be between 1 and {total} (got {step})");
            }
        }
    }
    let navigator = session.navigator();
    let view = StepView {
        step: navigator.current(),
        total_steps: navigator.total(),
        title: navigator.title(),
    };
    if args.json {
        return emit_json(&view);
    }
    println!("step {}/{}: {}", view.step, view.total_steps, view.title);
    Ok(())
}

#[derive(Serialize)]
struct ValidationView {
    valid: bool,
    errors: ErrorMap,
}

fn cmd_validate(workspace: &Workspace, args: OutputArgs) -> Result<()> {
    let mut session = workspace.session();
    let errors = session.validate_form();
    let view = ValidationView {
        valid: errors.is_empty(),
        errors,
    };
    if args.json {
        emit_json(&view)?;
    } else if view.valid {
        println!("draft is valid");
    } else {
        println!("{} validation error(s):", view.errors.len());
        print_errors(&view.errors);
    }
    if !view.valid {
        bail!("draft has {} validation error(s)", view.errors.len());
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusView {
    workspace: String,
    applicant: Option<String>,
    step: u8,
    step_title: &'static str,
    completion_percentage: u8,
    livelihood_category: Option<&'static str>,
    parcels: usize,
    can_submit: bool,
    should_hide_form: bool,
    application_status: ApplicationStatus,
}

fn cmd_status(workspace: &Workspace, args: StatusArgs) -> Result<()> {
    let mut session = workspace.session();
    let applicant = workspace.applicant(args.applicant).ok();
    if args.remote {
        let Some(id) = &applicant else {
            bail!("not logged in; run `rsbsa login` or pass --applicant");
        };
        if let StatusCheck::Failed(message) = session.check_application_status(id) {
            bail!("status lookup failed: {message}");
        }
    }
    let draft = session.draft();
    let view = StatusView {
        workspace: workspace.paths.root().display().to_string(),
        applicant,
        step: session.navigator().current(),
        step_title: session.navigator().title(),
        completion_percentage: session.completion_percentage(),
        livelihood_category: draft.livelihood_category().map(LivelihoodCategory::as_str),
        parcels: draft.farm_parcels.len(),
        can_submit: session.can_submit(),
        should_hide_form: session.should_hide_form(),
        application_status: session.application_status().clone(),
    };
    if args.json {
        return emit_json(&view);
    }
    println!("workspace: {}", view.workspace);
    println!(
        "applicant: {}",
        view.applicant.as_deref().unwrap_or("(not logged in)")
    );
    println!("step: {}/5 {}", view.step, view.step_title);
    println!("completion: {}%", view.completion_percentage);
    println!(
        "livelihood category: {}",
        view.livelihood_category.unwrap_or("(none)")
    );
    println!("parcels: {}", view.parcels);
    println!("can submit: {}", view.can_submit);
    println!(
        "application status: {} (active enrollment: {})",
        view.application_status.status, view.application_status.has_active_enrollment
    );
    Ok(())
}

#[derive(Serialize)]
struct LoadView {
    applicant: String,
    restore: &'static str,
    load: &'static str,
    load_error: Option<String>,
    application_status: ApplicationStatus,
    read_only: bool,
}

fn cmd_load(workspace: &Workspace, args: RemoteArgs) -> Result<()> {
    let applicant = workspace.applicant(args.applicant)?;
    let mut session = workspace.unrestored_session();
    let report = session.startup(&applicant);
    if let StatusCheck::Failed(message) = &report.status {
        tracing::warn!(message = %message, "application status unavailable");
    }
    session.flush_draft();
    let view = LoadView {
        applicant,
        restore: report.restore.label(),
        load: report.load.label(),
        load_error: session.submission().load_error.clone(),
        application_status: session.application_status().clone(),
        read_only: session.should_hide_form(),
    };
    if args.json {
        return emit_json(&view);
    }
    println!("existing enrollment: {}", view.load);
    if let Some(error) = &view.load_error {
        println!("warning: {error}");
    }
    println!(
        "application status: {} (active enrollment: {})",
        view.application_status.status, view.application_status.has_active_enrollment
    );
    Ok(())
}

#[derive(Serialize)]
struct SubmissionView {
    applicant: String,
    kind: SubmissionKind,
    outcome: &'static str,
    success: bool,
    message: Option<String>,
    errors: ErrorMap,
}

fn cmd_submission(workspace: &Workspace, args: RemoteArgs, kind: SubmissionKind) -> Result<()> {
    let applicant = workspace.applicant(args.applicant)?;
    let mut session = workspace.session();
    if let StatusCheck::Failed(message) = session.check_application_status(&applicant) {
        tracing::warn!(message = %message, "continuing without application status");
    }

    let start = Instant::now();
    let outcome = match kind {
        SubmissionKind::Submit => session.submit_form(&applicant),
        SubmissionKind::SaveDraft => session.save_draft(&applicant),
    };
    let elapsed_ms = start.elapsed().as_millis();
    session.flush_draft();

    let state = session.submission();
    let (message, errors) = match &outcome {
        SubmitOutcome::Invalid(errors) => (
            Some(format!("{} validation error(s)", errors.len())),
            errors.clone(),
        ),
        SubmitOutcome::Submitted | SubmitOutcome::DraftSaved => {
            (state.message.clone(), ErrorMap::new())
        }
        _ => (
            state.backend_errors.message.clone(),
            state.backend_errors.fields.clone(),
        ),
    };

    if outcome.reached_backend() {
        let record = SubmissionRecord {
            schema_version: HISTORY_SCHEMA_VERSION,
            recorded_at_epoch_ms: now_epoch_ms(),
            applicant_id: applicant.clone(),
            kind: kind.as_str().to_string(),
            outcome: outcome.label().to_string(),
            success: outcome.is_success(),
            message: message.clone(),
            elapsed_ms,
        };
        append_history(workspace.paths.root(), &record)?;
    }

    let view = SubmissionView {
        applicant,
        kind,
        outcome: outcome.label(),
        success: outcome.is_success(),
        message,
        errors,
    };
    if args.json {
        emit_json(&view)?;
    } else {
        println!(
            "{}: {}",
            kind.as_str(),
            view.message.as_deref().unwrap_or(view.outcome)
        );
        print_errors(&view.errors);
    }
    if !view.success {
        bail!("{} {}", kind.as_str(), view.outcome);
    }
    Ok(())
}

fn cmd_reset(workspace: &Workspace) -> Result<()> {
    let mut session = workspace.session();
    session.reset_form();
    println!("draft discarded");
    Ok(())
}
