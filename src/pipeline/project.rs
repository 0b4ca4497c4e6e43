//! Default pipeline: JSON buckets described by `i18n.toml`, translated by the engine.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{Pipeline, messages, watch};
use crate::config::{Credentials, LOCALE_PLACEHOLDER, ProjectConfig, UserSettings};
use crate::context::{RunContext, Task, TaskId, TaskOutcome};
use crate::flags::RunFlags;
use crate::localizer::{EngineLocalizer, LocalizeRequest, Localizer, Messages};
use crate::ui::TaskProgress;

pub struct ProjectPipeline {
    project_dir: PathBuf,
    show_progress: bool,
}

impl ProjectPipeline {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            show_progress: true,
        }
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress(&self, total: usize) -> TaskProgress {
        if self.show_progress {
            TaskProgress::new(total)
        } else {
            TaskProgress::hidden()
        }
    }
}

/// Does `path` pass the `--file` filter? Empty filter matches everything.
/// A filter matches as a glob or as a plain substring.
pub fn matches_file_filter(filters: &[String], path: &str) -> bool {
    filters.is_empty()
        || filters.iter().any(|f| {
            path.contains(f.as_str())
                || glob::Pattern::new(f)
                    .map(|p| p.matches(path))
                    .unwrap_or(false)
        })
}

/// Keep only messages whose key matches one of the `--key` globs.
pub fn filter_keys(messages: Messages, patterns: &[String]) -> Messages {
    if patterns.is_empty() {
        return messages;
    }
    let patterns: Vec<glob::Pattern> = patterns
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();
    messages
        .into_iter()
        .filter(|(key, _)| patterns.iter().any(|p| p.matches(key)))
        .collect()
}

/// Build the task list for one pass. Pure: reads only config and flags.
pub fn plan_tasks(config: &ProjectConfig, flags: &RunFlags) -> Result<Vec<Task>> {
    let source = config.effective_source(flags);
    let targets = config.effective_targets(flags);
    if targets.is_empty() {
        bail!("No target locales. Add [locale] targets to i18n.toml or pass --target-locale");
    }

    let buckets: Vec<_> = config
        .buckets
        .iter()
        .filter(|(name, _)| flags.bucket.is_empty() || flags.bucket.contains(*name))
        .collect();
    if buckets.is_empty() {
        if flags.bucket.is_empty() {
            bail!("No buckets configured in i18n.toml");
        }
        bail!("No configured bucket matches --bucket {}", flags.bucket.join(", "));
    }

    let mut tasks = Vec::new();
    for (name, bucket) in buckets {
        for pattern in &bucket.include {
            if !pattern.contains(LOCALE_PLACEHOLDER) {
                bail!(
                    "Include path '{}' in bucket '{}' has no {} placeholder",
                    pattern,
                    name,
                    LOCALE_PLACEHOLDER
                );
            }
            let source_rel = pattern.replace(LOCALE_PLACEHOLDER, &source);
            if !matches_file_filter(&flags.file, &source_rel) {
                debug!(path = %source_rel, "Skipped by --file filter");
                continue;
            }
            for target in &targets {
                tasks.push(Task {
                    id: TaskId::new(name, pattern, target),
                    bucket: name.clone(),
                    pattern: pattern.clone(),
                    source_locale: source.clone(),
                    target_locale: target.clone(),
                    source_path: config.root.join(&source_rel),
                    target_path: config.root.join(pattern.replace(LOCALE_PLACEHOLDER, target)),
                });
            }
        }
    }
    Ok(tasks)
}

/// Translate one task and write the merged target file.
pub async fn run_task(
    task: &Task,
    localizer: &dyn Localizer,
    keys: &[String],
    force: bool,
) -> Result<TaskOutcome> {
    let source = filter_keys(messages::read(&task.source_path)?, keys);
    let mut target = messages::read_or_empty(&task.target_path)?;

    let pending: Messages = source
        .into_iter()
        .filter(|(key, _)| force || !target.contains_key(key))
        .collect();
    if pending.is_empty() {
        return Ok(TaskOutcome::Skipped);
    }

    let count = pending.len();
    let translated = localizer
        .localize(LocalizeRequest {
            source_locale: task.source_locale.clone(),
            target_locale: task.target_locale.clone(),
            data: pending,
        })
        .await
        .with_context(|| format!("Failed to localize into {}", task.target_locale))?;
    target.extend(translated);
    messages::write(&task.target_path, &target)?;
    Ok(TaskOutcome::Localized { keys: count })
}

#[async_trait]
impl Pipeline for ProjectPipeline {
    async fn setup(&self, ctx: &mut RunContext) -> Result<()> {
        let config = ProjectConfig::load(&self.project_dir)?;
        let settings = UserSettings::load()?;
        let credentials =
            Credentials::resolve(&ctx.flags, &config, &settings, |name| std::env::var(name).ok())?;
        debug!(url = %credentials.api_url, "Using localization engine");
        let localizer = EngineLocalizer::new(credentials)?;

        ctx.config = Some(config);
        ctx.localizer = Some(Arc::new(localizer));
        Ok(())
    }

    async fn resolve_auth_id(&self, ctx: &RunContext) -> Result<Option<String>> {
        let localizer = ctx
            .localizer
            .as_ref()
            .context("Localizer not initialized")?;
        localizer.whoami().await
    }

    async fn plan(&self, ctx: &mut RunContext) -> Result<()> {
        let config = ctx.config.as_ref().context("Setup did not load a config")?;
        let tasks = plan_tasks(config, &ctx.flags)?;
        info!(tasks = tasks.len(), "Planned localization tasks");
        for task in tasks {
            ctx.upsert_task(task);
        }
        Ok(())
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let localizer = ctx
            .localizer
            .clone()
            .context("Setup did not create a localizer")?;
        let progress = self.progress(ctx.tasks.len());
        let keys = ctx.flags.key.clone();
        let force = ctx.flags.force;

        let outcomes: Vec<(TaskId, TaskOutcome)> = futures::stream::iter(ctx.tasks.clone())
            .map(|task| {
                let localizer = localizer.clone();
                let keys = keys.clone();
                async move {
                    let outcome = match run_task(&task, localizer.as_ref(), &keys, force).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let error = format!("{:#}", e);
                            warn!(task = %task.id, error = %error, "Task failed");
                            TaskOutcome::Failed { error }
                        }
                    };
                    (task.id, outcome)
                }
            })
            .buffer_unordered(ctx.flags.concurrency)
            .inspect(|(id, outcome)| progress.task_done(id.as_str(), outcome))
            .collect()
            .await;
        progress.finish();

        for (id, outcome) in outcomes {
            ctx.record(id, outcome);
        }
        Ok(())
    }

    async fn watch(&self, ctx: &mut RunContext) -> Result<()> {
        watch::run(self, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BucketConfig, EngineConfig, LocaleConfig};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    /// Prefixes every message with the target locale and records each request.
    #[derive(Default)]
    struct EchoLocalizer {
        requests: Mutex<Vec<LocalizeRequest>>,
    }

    #[async_trait]
    impl Localizer for EchoLocalizer {
        async fn localize(&self, request: LocalizeRequest) -> Result<Messages> {
            let out = request
                .data
                .iter()
                .map(|(k, v)| (k.clone(), format!("[{}] {}", request.target_locale, v)))
                .collect();
            self.requests.lock().unwrap().push(request);
            Ok(out)
        }

        async fn whoami(&self) -> Result<Option<String>> {
            Ok(Some("echo@example.com".into()))
        }
    }

    fn config(root: &Path, targets: &[&str]) -> ProjectConfig {
        ProjectConfig {
            locale: LocaleConfig {
                source: "en".into(),
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
            buckets: BTreeMap::from([(
                "json".to_string(),
                BucketConfig {
                    include: vec!["locales/[locale].json".into()],
                },
            )]),
            engine: EngineConfig::default(),
            root: root.to_path_buf(),
        }
    }

    fn project_with_source(json: &str) -> TempDir {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("locales")).unwrap();
        std::fs::write(dir.path().join("locales/en.json"), json).unwrap();
        dir
    }

    fn context(dir: &TempDir, flags: RunFlags, localizer: Arc<EchoLocalizer>) -> RunContext {
        let mut ctx = RunContext::new(flags);
        ctx.config = Some(config(dir.path(), &["es", "fr"]));
        ctx.localizer = Some(localizer);
        ctx
    }

    #[test]
    fn test_plan_tasks_one_per_target() {
        let dir = tempdir().unwrap();
        let tasks = plan_tasks(&config(dir.path(), &["es", "fr"]), &RunFlags::default()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].target_locale, "es");
        assert_eq!(tasks[0].source_path, dir.path().join("locales/en.json"));
        assert_eq!(tasks[1].target_path, dir.path().join("locales/fr.json"));
    }

    #[test]
    fn test_plan_tasks_without_targets_fails() {
        let dir = tempdir().unwrap();
        let err = plan_tasks(&config(dir.path(), &["en"]), &RunFlags::default()).unwrap_err();
        assert!(err.to_string().contains("No target locales"));
    }

    #[test]
    fn test_plan_tasks_unknown_bucket_filter_fails() {
        let dir = tempdir().unwrap();
        let flags = RunFlags {
            bucket: vec!["yaml".into()],
            ..RunFlags::default()
        };
        let err = plan_tasks(&config(dir.path(), &["es"]), &flags).unwrap_err();
        assert!(err.to_string().contains("--bucket yaml"));
    }

    #[test]
    fn test_plan_tasks_file_filter() {
        let dir = tempdir().unwrap();
        let flags = RunFlags {
            file: vec!["marketing".into()],
            ..RunFlags::default()
        };
        let tasks = plan_tasks(&config(dir.path(), &["es"]), &flags).unwrap();
        assert!(tasks.is_empty());

        let flags = RunFlags {
            file: vec!["locales/*.json".into()],
            ..RunFlags::default()
        };
        assert_eq!(plan_tasks(&config(dir.path(), &["es"]), &flags).unwrap().len(), 1);
    }

    #[test]
    fn test_filter_keys_by_glob() {
        let messages = Messages::from([
            ("auth.login".to_string(), "a".to_string()),
            ("auth.logout".to_string(), "b".to_string()),
            ("home.title".to_string(), "c".to_string()),
        ]);
        let kept = filter_keys(messages, &["auth.*".to_string()]);
        assert_eq!(kept.len(), 2);
        assert!(!kept.contains_key("home.title"));
    }

    #[tokio::test]
    async fn test_plan_and_execute_write_targets() {
        let dir = project_with_source(r#"{"greeting": "Hello", "nav": {"home": "Home"}}"#);
        let localizer = Arc::new(EchoLocalizer::default());
        let mut ctx = context(&dir, RunFlags::default(), localizer.clone());
        let pipeline = ProjectPipeline::new(dir.path()).without_progress();

        pipeline.plan(&mut ctx).await.unwrap();
        pipeline.execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.tally(), (2, 0, 0));
        let es = messages::read(&dir.path().join("locales/es.json")).unwrap();
        assert_eq!(es["nav.home"], "[es] Home");
        assert_eq!(localizer.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_existing_keys_skipped_unless_forced() {
        let dir = project_with_source(r#"{"greeting": "Hello", "bye": "Bye"}"#);
        std::fs::write(
            dir.path().join("locales/es.json"),
            r#"{"greeting": "Hola", "bye": "Adiós"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("locales/fr.json"), r#"{"greeting": "Bonjour"}"#).unwrap();

        let localizer = Arc::new(EchoLocalizer::default());
        let mut ctx = context(&dir, RunFlags::default(), localizer.clone());
        let pipeline = ProjectPipeline::new(dir.path()).without_progress();
        pipeline.plan(&mut ctx).await.unwrap();
        pipeline.execute(&mut ctx).await.unwrap();

        let es_id = TaskId::new("json", "locales/[locale].json", "es");
        let fr_id = TaskId::new("json", "locales/[locale].json", "fr");
        assert_eq!(ctx.results[&es_id], TaskOutcome::Skipped);
        assert_eq!(ctx.results[&fr_id], TaskOutcome::Localized { keys: 1 });
        let fr = messages::read(&dir.path().join("locales/fr.json")).unwrap();
        assert_eq!(fr["greeting"], "Bonjour");
        assert_eq!(fr["bye"], "[fr] Bye");

        let forced = RunFlags {
            force: true,
            ..RunFlags::default()
        };
        let mut ctx = context(&dir, forced, localizer);
        pipeline.plan(&mut ctx).await.unwrap();
        pipeline.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.results[&es_id], TaskOutcome::Localized { keys: 2 });
    }

    #[tokio::test]
    async fn test_dotted_source_keys_written_verbatim() {
        let dir = project_with_source(r#"{"Welcome back.": "Welcome back.", "menu": "Menu"}"#);
        std::fs::write(dir.path().join("locales/fr.json"), r#"{"menu": {"title": "Titre"}}"#)
            .unwrap();
        let localizer = Arc::new(EchoLocalizer::default());
        let mut ctx = context(&dir, RunFlags::default(), localizer);
        let pipeline = ProjectPipeline::new(dir.path()).without_progress();

        pipeline.plan(&mut ctx).await.unwrap();
        pipeline.execute(&mut ctx).await.unwrap();

        let es: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("locales/es.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            es,
            serde_json::json!({"Welcome back.": "[es] Welcome back.", "menu": "[es] Menu"})
        );

        // fr already nests messages under "menu": the task fails and the file is kept.
        let fr_id = TaskId::new("json", "locales/[locale].json", "fr");
        assert!(ctx.results[&fr_id].is_failed());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("locales/fr.json")).unwrap(),
            r#"{"menu": {"title": "Titre"}}"#
        );
    }

    #[tokio::test]
    async fn test_missing_source_recorded_as_failed_task() {
        let dir = tempdir().unwrap();
        let localizer = Arc::new(EchoLocalizer::default());
        let mut ctx = context(&dir, RunFlags::default(), localizer);
        let pipeline = ProjectPipeline::new(dir.path()).without_progress();

        pipeline.plan(&mut ctx).await.unwrap();
        pipeline.execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.tally(), (0, 0, 2));
        assert!(ctx.results.values().all(TaskOutcome::is_failed));
    }

    #[tokio::test]
    async fn test_execute_without_localizer_fails() {
        let dir = tempdir().unwrap();
        let mut ctx = RunContext::new(RunFlags::default());
        ctx.config = Some(config(dir.path(), &["es"]));
        let pipeline = ProjectPipeline::new(dir.path()).without_progress();
        assert!(pipeline.execute(&mut ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_setup_loads_config_and_localizer() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("i18n.toml"),
            "[locale]\nsource = \"en\"\ntargets = [\"es\"]\n[buckets.json]\ninclude = [\"locales/[locale].json\"]\n[engine]\nurl = \"http://127.0.0.1:9\"\n",
        )
        .unwrap();
        let flags = RunFlags {
            api_key: Some("test-key".into()),
            ..RunFlags::default()
        };
        let mut ctx = RunContext::new(flags);
        ProjectPipeline::new(dir.path())
            .setup(&mut ctx)
            .await
            .unwrap();
        assert!(ctx.config.is_some());
        assert!(ctx.localizer.is_some());
    }

    #[tokio::test]
    async fn test_setup_without_config_fails() {
        let dir = tempdir().unwrap();
        let mut ctx = RunContext::new(RunFlags::default());
        let err = ProjectPipeline::new(dir.path())
            .setup(&mut ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No i18n.toml found"));
        assert!(ctx.config.is_none());
    }
}
