//! Audio cue played when a run finishes.
//!
//! Playback is cosmetic: every failure is logged at debug level and dropped,
//! and a call never holds the caller longer than [`PLAYBACK_CEILING`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::errors::PlaybackError;

pub const PLAYBACK_CEILING: Duration = Duration::from_secs(3);
pub const ASSETS_DIR_ENV: &str = "LINGO_ASSETS_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Success,
    Failure,
}

impl SoundKind {
    pub fn file_name(self) -> &'static str {
        match self {
            SoundKind::Success => "success.wav",
            SoundKind::Failure => "failure.wav",
        }
    }

    /// Copy of the file compiled into the binary.
    pub fn bundled(self) -> &'static [u8] {
        match self {
            SoundKind::Success => include_bytes!("../assets/success.wav"),
            SoundKind::Failure => include_bytes!("../assets/failure.wav"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

/// One way of playing a file: a program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackStrategy {
    pub program: String,
    pub args: Vec<String>,
}

impl PlaybackStrategy {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| PlaybackError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(PlaybackError::NonZeroExit {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}

type StrategyBuilder = fn(&str) -> PlaybackStrategy;

fn paplay(file: &str) -> PlaybackStrategy {
    PlaybackStrategy::new("paplay", &[file])
}

fn aplay(file: &str) -> PlaybackStrategy {
    PlaybackStrategy::new("aplay", &[file])
}

fn afplay(file: &str) -> PlaybackStrategy {
    PlaybackStrategy::new("afplay", &[file])
}

fn powershell(file: &str) -> PlaybackStrategy {
    let quoted = file.replace('\'', "''");
    let script = format!(
        "try {{ (New-Object Media.SoundPlayer '{0}').PlaySync() }} catch {{ Start-Process -FilePath '{0}' }}",
        quoted
    );
    PlaybackStrategy::new("powershell", &["-NoProfile", "-Command", script.as_str()])
}

/// Ordered player candidates per platform. The first entry that exits
/// successfully wins. `paplay` decodes through libsndfile (WAV, FLAC, Ogg);
/// `aplay` only takes raw PCM and WAV.
const PLAYERS: &[(Platform, &[StrategyBuilder])] = &[
    (Platform::Linux, &[paplay, aplay]),
    (Platform::MacOs, &[afplay]),
    (Platform::Windows, &[powershell]),
    (Platform::Other, &[paplay, aplay]),
];

/// Strategies for playing `file` on `platform`, in the order they are tried.
pub fn strategies(platform: Platform, file: &Path) -> Vec<PlaybackStrategy> {
    let file = file.to_string_lossy().into_owned();
    PLAYERS
        .iter()
        .find(|(p, _)| *p == platform)
        .map(|(_, builders)| builders.iter().map(|build| build(file.as_str())).collect())
        .unwrap_or_default()
}

/// Try each strategy in order, stopping at the first that succeeds.
pub async fn play_first(strategies: &[PlaybackStrategy]) -> Result<(), PlaybackError> {
    let mut last = PlaybackError::NoStrategy;
    for strategy in strategies {
        match strategy.play().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!(error = %e, "Playback strategy failed");
                last = e;
            }
        }
    }
    Err(last)
}

/// Directories searched for the sound files, in order. When none holds
/// the file, the bundled copy is written to [`bundled_dir`].
pub fn asset_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::var_os(ASSETS_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir.join("assets"));
        dirs.push(exe_dir.join("..").join("share").join("lingo").join("assets"));
    }
    dirs.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"));
    dirs
}

pub fn bundled_dir() -> PathBuf {
    std::env::temp_dir().join("lingo-assets")
}

/// Write the bundled copy of `kind` into `dir`, reusing an identical file.
pub fn materialize(kind: SoundKind, dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(kind.file_name());
    let bytes = kind.bundled();
    if std::fs::read(&path).is_ok_and(|existing| existing == bytes) {
        return Ok(path);
    }
    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Plays completion sounds. Implementations never fail.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, kind: SoundKind);
}

/// Plays the bundled sound files with whatever player the host has.
pub struct AudioNotifier {
    platform: Platform,
    asset_dirs: Vec<PathBuf>,
    bundled_dir: PathBuf,
    ceiling: Duration,
}

impl AudioNotifier {
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
            asset_dirs: asset_dirs(),
            bundled_dir: bundled_dir(),
            ceiling: PLAYBACK_CEILING,
        }
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn with_asset_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.asset_dirs = dirs;
        self
    }

    pub fn with_bundled_dir(mut self, dir: PathBuf) -> Self {
        self.bundled_dir = dir;
        self
    }

    /// Path of the sound file for `kind`: the first existing candidate,
    /// else the bundled copy written out. If that write fails the bare file
    /// name is returned and the player fails quietly.
    pub fn sound_file(&self, kind: SoundKind) -> PathBuf {
        if let Some(found) = self
            .asset_dirs
            .iter()
            .map(|dir| dir.join(kind.file_name()))
            .find(|p| p.exists())
        {
            return found;
        }
        materialize(kind, &self.bundled_dir).unwrap_or_else(|e| {
            debug!(error = %e, "Could not write bundled notification sound");
            PathBuf::from(kind.file_name())
        })
    }

    /// Run `strategies` on a detached task and wait for it or the ceiling,
    /// whichever comes first. A player still running at the ceiling is left alone.
    pub async fn race(&self, strategies: Vec<PlaybackStrategy>) {
        let mut playback = tokio::spawn(async move { play_first(&strategies).await });
        tokio::select! {
            joined = &mut playback => match joined {
                Ok(Ok(())) => debug!("Notification sound played"),
                Ok(Err(e)) => debug!(error = %e, "Notification sound unavailable"),
                Err(e) => debug!(error = %e, "Notification task failed"),
            },
            _ = tokio::time::sleep(self.ceiling) => {
                debug!(ceiling_ms = self.ceiling.as_millis() as u64, "Notification still playing, continuing");
            }
        }
    }
}

impl Default for AudioNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notify for AudioNotifier {
    async fn notify(&self, kind: SoundKind) {
        let file = self.sound_file(kind);
        self.race(strategies(self.platform, &file)).await;
    }
}
