//! Crash dump reports.
//!
//! A [`CrashDump`] is built from an explicit [`CrashError`] captured where
//! the failure happened, plus whatever context the caller adds (plugins,
//! configuration, open windows). It is written as a readable report,
//! optionally followed by the compressed JSON data between
//! `===BEGIN CRASH DUMP===` and `===END CRASH DUMP===`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use mc_rs_plugin_api::LoadedPlugin;

use crate::config::CrashReportSection;
use crate::session::SessionSnapshot;

pub const FORMAT_VERSION: u32 = 1;

/// Lines of source shown on each side of the crash line.
const CODE_CONTEXT: u32 = 10;
const BASE64_LINE: usize = 76;

#[derive(Debug, Error)]
pub enum CrashDumpError {
    #[error("crash dump I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("crash dump serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// What went wrong, captured at the failure site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashError {
    /// First line of the error message.
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    #[serde(rename = "type")]
    pub kind: String,
    pub trace: Vec<String>,
}

impl CrashError {
    pub fn new(message: &str, kind: impl Into<String>) -> Self {
        Self {
            message: first_line(message),
            file: None,
            line: None,
            kind: kind.into(),
            trace: Vec::new(),
        }
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }

    /// From a panic, with a captured backtrace.
    pub fn from_panic(info: &std::panic::PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("panic with non-string payload");
        let trace = std::backtrace::Backtrace::force_capture()
            .to_string()
            .lines()
            .map(str::to_owned)
            .collect();
        let error = Self::new(message, "panic").with_trace(trace);
        match info.location() {
            Some(location) => error.with_location(location.file(), location.line()),
            None => error,
        }
    }

    /// From an error value; the source chain becomes the trace.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut trace = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self::new(&err.to_string(), "error").with_trace(trace)
    }
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().to_owned()
}

/// Which plugin, if any, the crash is blamed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PluginBlame {
    /// `false`: server code; `true`: plugin code that could not be identified.
    Flag(bool),
    Named(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CrashSection {
    #[serde(flatten)]
    pub error: CrashError,
    pub plugin: PluginBlame,
    /// Source excerpt keyed by 1-based line number.
    pub code: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionSection {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginSection {
    pub name: String,
    pub version: String,
    pub authors: Vec<String>,
    pub api: Vec<String>,
    pub enabled: bool,
    pub depends: Vec<String>,
    #[serde(rename = "softDepends")]
    pub soft_depends: Vec<String>,
    pub main: String,
    pub load: String,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformSection {
    pub os: String,
    pub arch: String,
    pub family: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrashData {
    pub format_version: u32,
    pub time: u64,
    pub crash: CrashSection,
    pub version: VersionSection,
    pub plugins: BTreeMap<String, PluginSection>,
    /// Server configuration text, secrets redacted. Empty unless enabled.
    pub config: String,
    pub platform: PlatformSection,
    pub windows: Vec<SessionSnapshot>,
}

/// A crash report under construction.
#[derive(Debug, Clone)]
pub struct CrashDump {
    data: CrashData,
    settings: CrashReportSection,
}

impl CrashDump {
    pub fn new(error: CrashError, settings: &CrashReportSection) -> Self {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let code = if settings.send_code {
            code_excerpt(&error)
        } else {
            BTreeMap::new()
        };
        let plugin = PluginBlame::Flag(is_plugin_source(error.file.as_deref()));
        Self {
            data: CrashData {
                format_version: FORMAT_VERSION,
                time,
                crash: CrashSection {
                    error,
                    plugin,
                    code,
                },
                version: VersionSection {
                    name: env!("CARGO_PKG_NAME").to_owned(),
                    version: env!("CARGO_PKG_VERSION").to_owned(),
                },
                plugins: BTreeMap::new(),
                config: String::new(),
                platform: PlatformSection {
                    os: std::env::consts::OS.to_owned(),
                    arch: std::env::consts::ARCH.to_owned(),
                    family: std::env::consts::FAMILY.to_owned(),
                },
                windows: Vec::new(),
            },
            settings: settings.clone(),
        }
    }

    /// Record loaded plugins and blame the one whose source holds the
    /// crash location.
    pub fn plugins(mut self, plugins: &[&dyn LoadedPlugin]) -> Self {
        for plugin in plugins {
            let d = plugin.descriptor();
            self.data.plugins.insert(
                d.name.clone(),
                PluginSection {
                    name: d.name.clone(),
                    version: d.version.clone(),
                    authors: d.authors.clone(),
                    api: d.api.clone(),
                    enabled: plugin.is_enabled(),
                    depends: d.depend.clone(),
                    soft_depends: d.soft_depend.clone(),
                    main: d.main.clone(),
                    load: d.load.to_string(),
                    website: d.website.clone(),
                },
            );
        }

        if let Some(file) = self.data.crash.error.file.as_deref() {
            let crashed = Path::new(file);
            if let Some(plugin) = plugins
                .iter()
                .find(|p| crashed.starts_with(p.source_path()))
            {
                self.data.crash.plugin = PluginBlame::Named(plugin.descriptor().name.clone());
            }
        }
        self
    }

    /// Attach the configuration file text; lines mentioning a password are
    /// masked. Ignored unless `send_settings` is on.
    pub fn config_text(mut self, text: &str) -> Self {
        if self.settings.send_settings {
            self.data.config = redact(text);
        }
        self
    }

    /// Attach session snapshots. Ignored unless `include_windows` is on.
    pub fn windows(mut self, sessions: Vec<SessionSnapshot>) -> Self {
        if self.settings.include_windows {
            self.data.windows = sessions;
        }
        self
    }

    pub fn data(&self) -> &CrashData {
        &self.data
    }

    pub fn time(&self) -> u64 {
        self.data.time
    }

    /// JSON, zlib-compressed at level 9.
    pub fn encoded_data(&self) -> Result<Vec<u8>, CrashDumpError> {
        let json = serde_json::to_vec(&self.data)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(9));
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    /// Write the readable report; with `full`, append the encoded data.
    pub fn write(&self, out: &mut impl Write, full: bool) -> Result<(), CrashDumpError> {
        let crash = &self.data.crash;
        writeln!(out, "MC-RS Crash Dump (unix time {})", self.data.time)?;
        writeln!(out)?;
        writeln!(out, "Error: {}", crash.error.message)?;
        writeln!(out, "File: {}", crash.error.file.as_deref().unwrap_or("unknown"))?;
        match crash.error.line {
            Some(line) => writeln!(out, "Line: {line}")?,
            None => writeln!(out, "Line: unknown")?,
        }
        writeln!(out, "Type: {}", crash.error.kind)?;

        match &crash.plugin {
            PluginBlame::Flag(false) => {}
            PluginBlame::Flag(true) => {
                writeln!(out)?;
                writeln!(out, "THIS CRASH WAS CAUSED BY A PLUGIN")?;
            }
            PluginBlame::Named(name) => {
                writeln!(out)?;
                writeln!(out, "THIS CRASH WAS CAUSED BY A PLUGIN")?;
                writeln!(out, "BAD PLUGIN: {name}")?;
            }
        }

        if !crash.code.is_empty() {
            writeln!(out)?;
            writeln!(out, "Code:")?;
            for (line, text) in &crash.code {
                writeln!(out, "[{line}] {text}")?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Backtrace:")?;
        for frame in &crash.error.trace {
            writeln!(out, "{frame}")?;
        }
        writeln!(out)?;

        let version = &self.data.version;
        let platform = &self.data.platform;
        writeln!(out, "{} version: {}", version.name, version.version)?;
        writeln!(out, "OS: {}, {} ({})", platform.os, platform.arch, platform.family)?;

        writeln!(out)?;
        writeln!(out, "Loaded plugins:")?;
        for plugin in self.data.plugins.values() {
            writeln!(
                out,
                "{} {} by {} for API(s) {}",
                plugin.name,
                plugin.version,
                plugin.authors.join(", "),
                plugin.api.join(", ")
            )?;
        }

        if full {
            let encoded = STANDARD.encode(self.encoded_data()?);
            writeln!(out)?;
            writeln!(
                out,
                "----------------------REPORT THE DATA BELOW THIS LINE-----------------------"
            )?;
            writeln!(out)?;
            writeln!(out, "===BEGIN CRASH DUMP===")?;
            for chunk in encoded.as_bytes().chunks(BASE64_LINE) {
                // base64 output is ASCII
                out.write_all(chunk)?;
                writeln!(out)?;
            }
            writeln!(out, "===END CRASH DUMP===")?;
        }
        Ok(())
    }

    /// Write the full report to `<dir>/<time>.log`, creating `dir`.
    pub fn write_to_directory(&self, dir: &Path) -> Result<PathBuf, CrashDumpError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", self.data.time));
        let mut file = std::fs::File::create(&path)?;
        self.write(&mut file, true)?;
        file.flush()?;
        Ok(path)
    }
}

/// Write a crash dump whenever a thread panics.
///
/// `enrich` adds context (plugins, config, windows) and must not block.
/// The previously installed hook still runs afterwards.
pub fn install_panic_hook<F>(settings: CrashReportSection, enrich: F)
where
    F: Fn(CrashDump) -> CrashDump + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let dump = enrich(CrashDump::new(CrashError::from_panic(info), &settings));
        match dump.write_to_directory(&settings.directory) {
            Ok(path) => error!("Crash dump written to {}", path.display()),
            Err(e) => error!("Failed to write crash dump: {e}"),
        }
        previous(info);
    }));
}

/// Server sources are Rust; crash locations in any other file come from
/// plugin scripts.
fn is_plugin_source(file: Option<&str>) -> bool {
    file.map(Path::new)
        .and_then(Path::extension)
        .is_some_and(|ext| ext != "rs")
}

fn code_excerpt(error: &CrashError) -> BTreeMap<u32, String> {
    let (Some(file), Some(line)) = (error.file.as_deref(), error.line) else {
        return BTreeMap::new();
    };
    let Ok(source) = std::fs::read_to_string(file) else {
        return BTreeMap::new();
    };
    let start = line.saturating_sub(CODE_CONTEXT);
    source
        .lines()
        .enumerate()
        .skip(start as usize)
        .take_while(|(index, _)| (*index as u32) < line.saturating_add(CODE_CONTEXT))
        .map(|(index, text)| (index as u32 + 1, text.to_owned()))
        .collect()
}

fn redact(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.to_ascii_lowercase().contains("password") {
                match line.split_once('=') {
                    Some((key, _)) => format!("{}= \"******\"", key),
                    None => "******".to_owned(),
                }
            } else {
                line.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use mc_rs_plugin_api::{PluginDescriptor, PluginEntry};
    use std::io::Read;

    fn settings() -> CrashReportSection {
        CrashReportSection::default()
    }

    fn entry(name: &str, source: &str) -> PluginEntry {
        let toml = format!(
            "[plugin]\nname = \"{name}\"\nversion = \"1.0\"\nauthors = [\"Dev\"]\napi = [\"1.0.0\"]\n"
        );
        let mut entry = PluginEntry::new(PluginDescriptor::from_toml_str(&toml).unwrap(), source);
        entry.set_enabled(true);
        entry
    }

    fn report(dump: &CrashDump, full: bool) -> String {
        let mut out = Vec::new();
        dump.write(&mut out, full).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[derive(Debug, Error)]
    #[error("window table corrupted\nsecond line")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn error_chain_becomes_trace() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        let crash = CrashError::from_error(&err);
        assert_eq!(crash.message, "window table corrupted");
        assert_eq!(crash.kind, "error");
        assert_eq!(crash.trace, vec!["caused by: disk gone"]);
    }

    #[test]
    fn server_crash_is_not_blamed_on_plugins() {
        let error = CrashError::new("boom", "panic").with_location("crates/mc-rs-inventory/src/window.rs", 9);
        let a = entry("Alpha", "plugins/Alpha");
        let dump = CrashDump::new(error, &settings()).plugins(&[&a]);
        assert_eq!(dump.data().crash.plugin, PluginBlame::Flag(false));
        let text = report(&dump, false);
        assert!(!text.contains("THIS CRASH WAS CAUSED BY A PLUGIN"));
        assert!(text.contains("Alpha 1.0 by Dev for API(s) 1.0.0"));
    }

    #[test]
    fn crash_in_plugin_source_names_the_plugin() {
        let error = CrashError::new("bad lapis", "error").with_location("plugins/Beta/main.lua", 3);
        let (a, b) = (entry("Alpha", "plugins/Alpha"), entry("Beta", "plugins/Beta"));
        let dump = CrashDump::new(error, &settings()).plugins(&[&a, &b]);
        assert_eq!(dump.data().crash.plugin, PluginBlame::Named("Beta".into()));
        let text = report(&dump, false);
        assert!(text.contains("THIS CRASH WAS CAUSED BY A PLUGIN"));
        assert!(text.contains("BAD PLUGIN: Beta"));
    }

    #[test]
    fn unknown_script_is_unidentified_plugin() {
        let error = CrashError::new("oops", "error").with_location("scripts/loose.lua", 1);
        let dump = CrashDump::new(error, &settings()).plugins(&[]);
        assert_eq!(dump.data().crash.plugin, PluginBlame::Flag(true));
        let text = report(&dump, false);
        assert!(text.contains("THIS CRASH WAS CAUSED BY A PLUGIN"));
        assert!(!text.contains("BAD PLUGIN"));
    }

    #[test]
    fn code_excerpt_surrounds_crash_line() {
        let path = std::env::temp_dir().join(format!("mc-rs-crash-src-{}.rs", std::process::id()));
        let source: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&path, source).unwrap();

        let error = CrashError::new("boom", "panic").with_location(path.to_string_lossy(), 15);
        let dump = CrashDump::new(error.clone(), &settings());
        let code = &dump.data().crash.code;
        assert_eq!(code.len(), 20);
        assert_eq!(code.keys().next(), Some(&6));
        assert_eq!(code.get(&15).map(String::as_str), Some("line 15"));
        assert!(report(&dump, false).contains("[15] line 15"));

        let quiet = CrashReportSection {
            send_code: false,
            ..settings()
        };
        assert!(CrashDump::new(error, &quiet).data().crash.code.is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn config_passwords_are_redacted() {
        let text = "[server]\nname = \"x\"\nrcon_password = \"hunter2\"\n";
        let dump = CrashDump::new(CrashError::new("x", "error"), &settings()).config_text(text);
        assert!(!dump.data().config.contains("hunter2"));
        assert!(dump.data().config.contains("rcon_password = \"******\""));
        assert!(dump.data().config.contains("name = \"x\""));

        let private = CrashReportSection {
            send_settings: false,
            ..settings()
        };
        let dump = CrashDump::new(CrashError::new("x", "error"), &private).config_text(text);
        assert!(dump.data().config.is_empty());
    }

    #[test]
    fn full_report_embeds_compressed_json() {
        let dump = CrashDump::new(
            CrashError::new("first\nsecond", "panic").with_trace(vec!["frame 0".into()]),
            &settings(),
        );
        let text = report(&dump, true);
        assert!(text.contains("Error: first\n"));
        assert!(text.contains("Backtrace:\nframe 0\n"));

        let body: Vec<&str> = text
            .lines()
            .skip_while(|l| *l != "===BEGIN CRASH DUMP===")
            .skip(1)
            .take_while(|l| *l != "===END CRASH DUMP===")
            .collect();
        assert!(!body.is_empty());
        assert!(body.iter().all(|l| l.len() <= 76));

        let compressed = STANDARD.decode(body.concat()).unwrap();
        let mut json = String::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_string(&mut json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format_version"], 1);
        assert_eq!(value["crash"]["message"], "first");
        assert_eq!(value["crash"]["type"], "panic");
        assert_eq!(value["crash"]["plugin"], false);
        assert_eq!(value["platform"]["os"], std::env::consts::OS);
    }

    #[test]
    fn writes_report_file() {
        let dir = std::env::temp_dir().join(format!("mc-rs-crashdumps-{}", std::process::id()));
        let dump = CrashDump::new(CrashError::new("disk", "error"), &settings());
        let path = dump.write_to_directory(&dir).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("MC-RS Crash Dump"));
        assert!(text.contains("===END CRASH DUMP==="));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
