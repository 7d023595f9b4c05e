//! Directory audit: extract, repair, re-pack and sign each capsule.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::AuditConfig;
use crate::AuditError;
use crate::AuditProgress;
use crate::ManifestValidator;
use crate::NoopProgress;
use crate::RepairLog;
use crate::Result;
use crate::ValidationScore;
use crate::archive::extract_zip;
use crate::archive::pack_directory;
use crate::archive::sign_archive;
use crate::audit::assist::ASSIST_PROMPT;
use crate::audit::assist::Advisor;
use crate::audit::assist::AgentAssist;
use crate::audit::assist::AssistRequest;
use crate::audit::discovery::FileMatch;
use crate::audit::discovery::count_files;
use crate::audit::discovery::discover_sources;
use crate::audit::discovery::find_file;
use crate::audit::metadata::ASSIST_NAME;
use crate::audit::metadata::PERSONALITY_NAME;
use crate::audit::metadata::REFLECT_NAME;
use crate::audit::metadata::ReflectDocument;
use crate::audit::metadata::SUMMARY_NAME;
use crate::audit::metadata::write_json;
use crate::audit::metadata::write_yaml;
use crate::audit::summary::ArchiveAudit;
use crate::audit::summary::AuditBatch;
use crate::audit::summary::AuditOutcome;
use crate::audit::summary::RepairSummary;
use crate::manifest::MANIFEST_NAME;
use crate::repair_log::REPAIR_LOG_NAME;

/// Suffix inserted between the stem and extension of repaired archives.
pub const REPAIRED_SUFFIX: &str = "_REPAIRED";

/// Audits every capsule archive in a directory.
///
/// Each archive is processed to completion before the next one starts, in
/// its own scratch directory `<base>/<scratch_prefix><stem>`. A failing
/// archive becomes [`AuditOutcome::Failed`] and does not stop the batch.
///
/// # Examples
///
/// ```no_run
/// use capaudit_core::AuditConfig;
/// use capaudit_core::Auditor;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let auditor = Auditor::new(AuditConfig::default().with_output_dir("audited"))?;
/// let batch = auditor.audit_directory(Path::new("capsules"), false)?;
/// for (name, outcome) in &batch.outcomes {
///     if let Some(summary) = outcome.summary() {
///         println!("{name}: {}/100", summary.score.display_total());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Auditor {
    config: AuditConfig,
    validator: ManifestValidator,
    advisor: Option<Box<dyn Advisor>>,
}

impl Auditor {
    /// Creates an auditor, checking the configuration first.
    pub fn new(config: AuditConfig) -> Result<Self> {
        config.validate()?;
        let validator = ManifestValidator::new(config.policy.clone());
        Ok(Self {
            config,
            validator,
            advisor: None,
        })
    }

    /// Installs the advisor consulted for capsules with `agent_assist.yaml`.
    #[must_use]
    pub fn with_advisor(mut self, advisor: Box<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Lists the archives in `base_dir` that will be audited, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_dir` cannot be read.
    pub fn select_archives(&self, base_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut archives = Vec::new();
        for entry in fs::read_dir(base_dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!(
                        base_dir = %base_dir.display(),
                        error = %e,
                        "unreadable directory entry skipped"
                    );
                    continue;
                }
            };
            let selected = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.config.is_archive_name(n));
            if selected {
                archives.push(path);
            }
        }
        archives.sort();
        Ok(archives)
    }

    /// Audits every archive in `base_dir`.
    ///
    /// # Errors
    ///
    /// Only fails when `base_dir` itself cannot be listed; per-archive
    /// failures are recorded in the returned batch.
    pub fn audit_directory(&self, base_dir: &Path, dry_run: bool) -> Result<AuditBatch> {
        self.audit_directory_with_progress(base_dir, dry_run, &mut NoopProgress)
    }

    /// Audits every archive in `base_dir`, reporting progress.
    pub fn audit_directory_with_progress(
        &self,
        base_dir: &Path,
        dry_run: bool,
        progress: &mut dyn AuditProgress,
    ) -> Result<AuditBatch> {
        let archives = self.select_archives(base_dir)?;
        let total = archives.len();
        tracing::info!(
            base_dir = %base_dir.display(),
            archives = total,
            dry_run,
            "auditing capsule directory"
        );

        let mut batch = AuditBatch::default();
        for (idx, path) in archives.iter().enumerate() {
            progress.on_archive_start(path, total, idx + 1);
            let name = display_name(path);

            let outcome = match self.audit_archive(path, dry_run) {
                Ok(audit) => {
                    if let Some(repaired) = &audit.repaired_path {
                        batch.repaired.push(repaired.clone());
                    }
                    AuditOutcome::Audited(audit)
                }
                Err(err) => {
                    if err.is_archive_local() {
                        tracing::warn!(archive = %name, error = %err, "archive skipped");
                    } else {
                        tracing::error!(archive = %name, error = %err, "archive skipped");
                    }
                    AuditOutcome::Failed {
                        archive: name.clone(),
                        reason: err.to_string(),
                    }
                }
            };

            progress.on_archive_complete(&name, &outcome);
            batch.outcomes.insert(name, outcome);
        }

        progress.on_complete();
        tracing::info!(
            audited = batch.audited_count(),
            failed = batch.failed_count(),
            "capsule audit finished"
        );
        Ok(batch)
    }

    /// Audits a single archive.
    ///
    /// The scratch directory is removed afterwards whether or not the pass
    /// succeeded.
    pub fn audit_archive(&self, archive: &Path, dry_run: bool) -> Result<ArchiveAudit> {
        let stem = archive
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AuditError::ArchiveUnreadable {
                path: archive.to_path_buf(),
                reason: "archive name is not valid UTF-8".to_string(),
            })?;
        let parent = archive.parent().unwrap_or_else(|| Path::new("."));
        let scratch = parent.join(format!("{}{stem}", self.config.scratch_prefix));

        tracing::info!(archive = %archive.display(), scratch = %scratch.display(), "auditing archive");
        let result = reset_dir(&scratch).and_then(|()| self.repair(archive, stem, &scratch, dry_run));

        if let Err(e) = fs::remove_dir_all(&scratch)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(scratch = %scratch.display(), error = %e, "scratch directory not removed");
        }

        result
    }

    fn repair(
        &self,
        archive: &Path,
        stem: &str,
        scratch: &Path,
        dry_run: bool,
    ) -> Result<ArchiveAudit> {
        let name = display_name(archive);

        if let Some(backup_dir) = &self.config.backup_dir {
            fs::create_dir_all(backup_dir)?;
            let target = backup_dir.join(&name);
            if is_same_file(archive, &target)? {
                tracing::debug!(archive = %name, "backup target is the archive itself; copy skipped");
            } else {
                fs::copy(archive, &target)?;
                tracing::debug!(archive = %name, backup = %backup_dir.display(), "archive backed up");
            }
        }

        let extraction = extract_zip(archive, scratch)?;
        tracing::debug!(
            archive = %name,
            files = extraction.files_extracted,
            bytes = extraction.bytes_written,
            skipped = extraction.skipped.len(),
            "archive extracted"
        );

        let manifest = find_file(scratch, MANIFEST_NAME)?;
        let reflect = find_file(scratch, REFLECT_NAME)?;
        let assist = find_file(scratch, ASSIST_NAME)?;
        let personality = find_file(scratch, PERSONALITY_NAME)?;

        let mut log = RepairLog::create(&scratch.join(REPAIR_LOG_NAME))?;
        log.record("Capsule Repair Summary:");

        let mut diagnostics = Vec::new();
        if extraction.has_skipped() {
            tracing::warn!(archive = %name, skipped = extraction.skipped.len(), "unsafe entries skipped");
        }
        for skipped in &extraction.skipped {
            log.record(format!("Skipped entry: {skipped}"));
            diagnostics.push(format!("skipped entry: {skipped}"));
        }
        for found in [&manifest, &reflect, &assist, &personality].into_iter().flatten() {
            if let Some(note) = ambiguity_note(found, scratch) {
                tracing::warn!(archive = %name, "{note}");
                log.record(note.clone());
                diagnostics.push(note);
            }
        }

        let validation = manifest
            .as_ref()
            .map(|m| self.validator.repair_file(&m.path, scratch, dry_run, &mut log))
            .transpose()?;
        if manifest.is_none() {
            log.record("No manifest.json found; default score applied.");
        }
        let score = validation
            .as_ref()
            .map_or_else(ValidationScore::perfect, |v| v.score);

        self.regenerate_reflect(scratch, reflect.as_ref(), score, dry_run, &mut log)?;
        if personality.is_none() {
            self.inject_personality(scratch, &mut log)?;
        }
        if let Some(found) = &assist {
            self.consult_advisor(&found.path, &mut log);
        }

        let summary = RepairSummary {
            archive: name.clone(),
            score,
            unknown_permissions: validation
                .as_ref()
                .map(|v| v.unknown_permissions.clone())
                .unwrap_or_default(),
            missing_files: validation
                .as_ref()
                .map(|v| v.missing_files.clone())
                .unwrap_or_default(),
            files: count_files(scratch)?,
            repaired: !dry_run,
            diagnostics,
        };
        write_json(&scratch.join(SUMMARY_NAME), &summary)?;

        log.record(format!("Score: {}/100", score.total()));
        log.finish()?;

        if dry_run {
            tracing::info!(archive = %name, score = score.total(), "dry run complete");
            return Ok(ArchiveAudit {
                summary,
                repaired_path: None,
                signature: None,
            });
        }

        fs::create_dir_all(&self.config.output_dir)?;
        let repaired_path = self.config.output_dir.join(repaired_name(archive, stem));
        let packed = pack_directory(scratch, &repaired_path, self.config.compression_level)?;
        let record = sign_archive(&repaired_path)?;
        tracing::info!(
            archive = %name,
            repaired = %repaired_path.display(),
            files = packed.files_added,
            score = score.total(),
            sha256 = %record.digest,
            "repaired archive written"
        );

        Ok(ArchiveAudit {
            summary,
            repaired_path: Some(repaired_path),
            signature: Some(record.digest),
        })
    }

    fn regenerate_reflect(
        &self,
        scratch: &Path,
        existing: Option<&FileMatch>,
        score: ValidationScore,
        dry_run: bool,
        log: &mut RepairLog,
    ) -> Result<()> {
        let path = existing.map_or_else(|| scratch.join(REFLECT_NAME), |m| m.path.clone());
        let files = discover_sources(scratch, &self.config)?;
        let count = files.len();
        let document = ReflectDocument::new(
            &self.config.templates,
            files,
            self.config.policy.provenance(),
            score,
        );

        let verb = if existing.is_some() { "Regenerated" } else { "Synthesized" };
        if dry_run {
            log.record(format!(
                "Dry run: {REFLECT_NAME} not written ({count} source files discovered)."
            ));
        } else {
            write_yaml(&path, &document)?;
            log.record(format!("{verb} {REFLECT_NAME} ({count} source files)."));
        }
        Ok(())
    }

    /// Written in dry runs too; it only lives in the scratch tree then.
    fn inject_personality(&self, scratch: &Path, log: &mut RepairLog) -> Result<()> {
        write_yaml(
            &scratch.join(PERSONALITY_NAME),
            &self.config.templates.personality,
        )?;
        log.record(format!("Injected default {PERSONALITY_NAME}"));
        Ok(())
    }

    fn consult_advisor(&self, assist_path: &Path, log: &mut RepairLog) {
        let assist = match AgentAssist::load(assist_path) {
            Ok(assist) => assist,
            Err(e) => {
                log.record(format!("{ASSIST_NAME} unreadable: {e}"));
                return;
            }
        };
        let Some(gpt_id) = assist.active_id() else {
            return;
        };

        let Some(advisor) = &self.advisor else {
            log.record(format!("Assist requested ({gpt_id}) but no advisor is configured."));
            return;
        };

        let endpoint = assist
            .help_url
            .as_deref()
            .unwrap_or(self.config.templates.gpt_hook.endpoint.as_str());
        let request = AssistRequest {
            gpt_id,
            endpoint,
            prompt: ASSIST_PROMPT,
        };
        match advisor.advise(&request) {
            Ok(note) => log.record(format!("GPT Suggestion ({gpt_id}): {note}")),
            Err(e) => {
                tracing::warn!(gpt_id, endpoint, error = %e, "advisor request failed");
                log.record(format!("GPT Suggestion ({gpt_id}): [GPT Error] {e}"));
            }
        }
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("config", &self.config)
            .field("advisor", &self.advisor.is_some())
            .finish_non_exhaustive()
    }
}

/// Destroys any stale directory at `path` and creates it empty.
fn reset_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "stale scratch directory removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Whether `target` already resolves to `source`.
fn is_same_file(source: &Path, target: &Path) -> Result<bool> {
    if !target.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(source)? == fs::canonicalize(target)?)
}

/// `<stem>_REPAIRED.<ext>`, keeping the original extension.
fn repaired_name(archive: &Path, stem: &str) -> String {
    match archive.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{REPAIRED_SUFFIX}.{ext}"),
        None => format!("{stem}{REPAIRED_SUFFIX}"),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn ambiguity_note(found: &FileMatch, root: &Path) -> Option<String> {
    if !found.is_ambiguous() {
        return None;
    }
    let relative = |p: &Path| p.strip_prefix(root).unwrap_or(p).display().to_string();
    let others = found
        .duplicates
        .iter()
        .map(|p| relative(p))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "Multiple candidates found; using {} (also: {others})",
        relative(&found.path)
    ))
}
