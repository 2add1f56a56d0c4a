//! The two host commands: recording a build and viewing the history.
//!
//! Recording reads the manifest and stores, proposes the next version, lets
//! the user accept or customize it through a [`PromptSource`], then writes
//! the manifest, history log and journal in that order. Only the manifest
//! write can fail the command once prompting is over; the other two writes
//! are reported as warnings.

mod error;
mod prompt;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use time::OffsetDateTime;

use crate::build_config::{self, BuildConfig};
use crate::build_info::{self, BuildInfo, DEFAULT_NOTES};
use crate::env_probe::{self, EnvSnapshot, RegistryLookup, SystemRegistry, ToolVersions};
use crate::history_log;
use crate::journal;
use crate::manifest::{self, CommentStripper, LenientParser, ManifestVersion};
use crate::settings::ToolSettings;
use crate::version::{self, BumpKind};

pub use error::RecordError;
pub use prompt::{PickItem, PromptError, PromptSource, TerminalPrompter};

/// Everything a command needs from the outside world.
pub struct RecordContext {
    /// Open project directory, if any.
    pub project_dir: Option<PathBuf>,
    pub env: EnvSnapshot,
    pub settings: ToolSettings,
    /// Timestamp recorded for the build.
    pub now: OffsetDateTime,
    pub registry: Box<dyn RegistryLookup>,
    pub parser: Box<dyn LenientParser>,
}

impl RecordContext {
    /// Context backed by the system registry and the comment-stripping parser.
    pub fn new(
        project_dir: Option<PathBuf>,
        env: EnvSnapshot,
        settings: ToolSettings,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            project_dir,
            env,
            settings,
            now,
            registry: Box::new(SystemRegistry),
            parser: Box::new(CommentStripper),
        }
    }

    pub fn with_registry(mut self, registry: Box<dyn RegistryLookup>) -> Self {
        self.registry = registry;
        self
    }

    fn project(&self) -> Result<&Path, RecordError> {
        match self.project_dir.as_deref() {
            Some(dir) if dir.is_dir() => Ok(dir),
            other => Err(RecordError::NoProject {
                path: other.map(Path::to_path_buf),
            }),
        }
    }
}

/// Result of a recording run that did not fail.
#[derive(Debug)]
pub enum RecordOutcome {
    Recorded(RecordSummary),
    /// The user cancelled a prompt; nothing after that point was written.
    Aborted,
}

/// What was written, for the confirmation message.
#[derive(Debug)]
pub struct RecordSummary {
    pub info: BuildInfo,
    pub manifest_path: PathBuf,
    pub history_path: PathBuf,
    pub journal_path: PathBuf,
    /// Soft failures of the history log or journal writes.
    pub warnings: Vec<String>,
}

impl fmt::Display for RecordSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Build recorded.")?;
        writeln!(
            f,
            "Version: {} ({})",
            self.info.version_name, self.info.version_code
        )?;
        writeln!(f, "Builder: {}", self.info.builder)?;
        writeln!(f, "IDE: {}", self.info.ide_version)?;
        write!(f, "DevTools: {}", self.info.dev_tool_version)?;
        for warning in &self.warnings {
            write!(f, "\nWarning: {warning}")?;
        }
        Ok(())
    }
}

/// Version and builder chosen by the user.
struct Choices {
    version_name: String,
    builder: String,
    notes: String,
}

/// Run the interactive "record build version" command.
pub fn record_build(
    ctx: &RecordContext,
    prompts: &mut dyn PromptSource,
) -> Result<RecordOutcome, RecordError> {
    let project = ctx.project()?;
    let manifest_path = manifest::manifest_path(project);
    if !manifest_path.is_file() {
        return Err(RecordError::ManifestMissing {
            path: manifest_path,
        });
    }
    let current = manifest::read_manifest(&manifest_path, ctx.parser.as_ref())?;

    let config = build_config::load(project);
    let journal_path = journal::journal_path(project);
    let last_build = journal::load(&journal_path);
    let tools = env_probe::probe_tools(&ctx.env, &ctx.settings, ctx.registry.as_ref());
    let builder = config
        .builder_name()
        .map(str::to_string)
        .unwrap_or_else(|| env_probe::system_username(&ctx.env));

    let version_code = current.version_code.saturating_add(1);
    let Some(choices) = ask_choices(
        prompts,
        project,
        &current,
        version_code,
        builder,
        last_build.as_ref(),
    )?
    else {
        tracing::info!("Recording cancelled by user");
        return Ok(RecordOutcome::Aborted);
    };

    let default_notes = ctx.settings.default_notes.as_deref().unwrap_or(DEFAULT_NOTES);
    let info = BuildInfo::new(
        ctx.now,
        choices.version_name,
        version_code,
        &tools,
        choices.builder,
        build_info::resolve_notes(&choices.notes, default_notes),
    );
    Ok(RecordOutcome::Recorded(write_artifacts(
        project,
        manifest_path,
        journal_path,
        version_code,
        info,
    )?))
}

fn ask_choices(
    prompts: &mut dyn PromptSource,
    project: &Path,
    current: &ManifestVersion,
    version_code: u64,
    mut builder: String,
    last_build: Option<&BuildInfo>,
) -> Result<Option<Choices>, RecordError> {
    let proposed = version::bump(&current.version_name, BumpKind::Patch);
    let mut title = String::from("How do you want to record this build?");
    if let Some(last) = last_build {
        title.push_str(&format!(
            " (last: {} ({}) on {})",
            last.version_name, last.version_code, last.date
        ));
    }
    let modes = [
        PickItem::new(
            "Quick record",
            format!("version {proposed} ({version_code}), builder: {builder}"),
        ),
        PickItem::new("Customize", "Change the version number or builder"),
    ];
    let Some(mode) = prompts.pick(&title, &modes)? else {
        return Ok(None);
    };
    if mode == 0 {
        return Ok(Some(Choices {
            version_name: proposed,
            builder,
            notes: String::new(),
        }));
    }

    let Some(version_name) = ask_version(prompts, &current.version_name, &proposed)? else {
        return Ok(None);
    };

    let keep_label = format!("Keep current: {builder}");
    let Some(builder_choice) = prompts.pick(
        "Builder",
        &[
            PickItem::new(keep_label, ""),
            PickItem::new("Change builder", ""),
        ],
    )?
    else {
        return Ok(None);
    };
    if builder_choice == 1 {
        let Some(entered) = prompts.input("Builder name", &builder)? else {
            return Ok(None);
        };
        let entered = entered.trim();
        if !entered.is_empty() && entered != builder {
            builder = entered.to_string();
            build_config::save(project, &BuildConfig::with_builder_name(&builder));
        }
    }

    let Some(notes) = prompts.input("Build notes (optional, Enter to skip)", "")? else {
        return Ok(None);
    };
    Ok(Some(Choices {
        version_name,
        builder,
        notes,
    }))
}

fn ask_version(
    prompts: &mut dyn PromptSource,
    current: &str,
    proposed: &str,
) -> Result<Option<String>, RecordError> {
    const KINDS: [BumpKind; 3] = [BumpKind::Patch, BumpKind::Minor, BumpKind::Major];
    let mut items: Vec<PickItem> = KINDS
        .iter()
        .map(|kind| {
            PickItem::new(
                format!("Bump {kind}"),
                format!("{current} -> {}", version::bump(current, *kind)),
            )
        })
        .collect();
    items.push(PickItem::new("Enter manually", "Type the new version number"));

    let Some(choice) = prompts.pick("How should the version change?", &items)? else {
        return Ok(None);
    };
    if let Some(kind) = KINDS.get(choice) {
        return Ok(Some(version::bump(current, *kind)));
    }

    let Some(entered) = prompts.input("New version number", proposed)? else {
        return Ok(None);
    };
    let entered = entered.trim();
    if entered.is_empty() {
        return Ok(None);
    }
    if !version::is_semver(entered) {
        tracing::warn!("Version '{entered}' is not a strict semantic version; recording it anyway");
    }
    Ok(Some(entered.to_string()))
}

fn write_artifacts(
    project: &Path,
    manifest_path: PathBuf,
    journal_path: PathBuf,
    version_code: u64,
    info: BuildInfo,
) -> Result<RecordSummary, RecordError> {
    manifest::write_version_fields(&manifest_path, &info.version_name, version_code)?;

    let mut warnings = Vec::new();
    let history_path = history_log::history_path(project);
    if let Err(err) = history_log::ensure_initialized(&history_path)
        .and_then(|()| history_log::append_row(&history_path, &info))
    {
        tracing::error!("Build history not updated: {err}");
        warnings.push(format!("Build history not updated: {err}"));
    }
    if let Err(err) = journal::record(&journal_path, info.clone()) {
        tracing::error!("Build journal not updated: {err}");
        warnings.push(format!("Build journal not updated: {err}"));
    }

    tracing::info!(
        "Recorded build {} ({}) by {}",
        info.version_name,
        info.version_code,
        info.builder
    );
    Ok(RecordSummary {
        info,
        manifest_path,
        history_path,
        journal_path,
        warnings,
    })
}

/// Resolve the history log for the "view build history" command.
pub fn view_history(project_dir: Option<&Path>) -> Result<PathBuf, RecordError> {
    let project = match project_dir {
        Some(dir) if dir.is_dir() => dir,
        other => {
            return Err(RecordError::NoProject {
                path: other.map(Path::to_path_buf),
            });
        }
    };
    let path = history_log::history_path(project);
    if !path.is_file() {
        return Err(RecordError::HistoryMissing { path });
    }
    Ok(path)
}

/// Probe results without running the flow, for diagnostics.
pub fn probe_environment(ctx: &RecordContext) -> ToolVersions {
    env_probe::probe_tools(&ctx.env, &ctx.settings, ctx.registry.as_ref())
}
