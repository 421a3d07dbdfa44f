//! Offline catalog generation: walks each category's asset folder and asks
//! the text-generation service to describe every file by name.

use crate::catalog::Catalog;
use crate::generation::TextGenerator;
use crate::mcp::contracts::{CATEGORIES, CategorySpec};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

pub const VALID_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "gif", "pdf", "ppt", "pptx"];

const SYSTEM_PROMPT: &str =
    "You are an assistant that intelligently describes design and branding assets.";

pub struct DescribeJob<'a> {
    pub root: &'a Path,
    pub output_dir: &'a Path,
    pub master_log: &'a Path,
    pub generator: &'a dyn TextGenerator,
}

#[derive(Debug)]
pub struct CategoryOutcome {
    pub tool_name: &'static str,
    pub folder: PathBuf,
    pub output: PathBuf,
    pub described: usize,
}

impl DescribeJob<'_> {
    pub fn run(&self) -> Result<Vec<CategoryOutcome>> {
        fs::create_dir_all(self.output_dir).with_context(|| {
            format!("failed to create output dir {}", self.output_dir.display())
        })?;

        let mut outcomes = Vec::with_capacity(CATEGORIES.len());
        for spec in &CATEGORIES {
            outcomes.push(self.describe_category(spec)?);
        }

        let lines: Vec<String> = outcomes
            .iter()
            .map(|outcome| format!("{} -> {}", outcome.folder.display(), outcome.output.display()))
            .collect();
        if let Err(err) = append_master_log(self.master_log, &lines) {
            error!(path = %self.master_log.display(), error = %err, "failed to update master log");
        } else {
            info!(path = %self.master_log.display(), "master log updated");
        }

        Ok(outcomes)
    }

    fn describe_category(&self, spec: &CategorySpec) -> Result<CategoryOutcome> {
        let folder = self.root.join(spec.source_folder);
        let output = self.output_dir.join(spec.catalog_file);
        info!(folder = %folder.display(), "scanning category");

        if !folder.exists() {
            warn!(folder = %folder.display(), "category folder missing; creating it");
            fs::create_dir_all(&folder)
                .with_context(|| format!("failed to create {}", folder.display()))?;
        }

        let mut catalog = Catalog::new();
        for path in asset_files(&folder) {
            let description = self.describe_file(&path);
            info!(file = %path.display(), "described");
            catalog.insert(path.display().to_string(), Value::String(description));
        }

        let described = catalog.len();
        match write_catalog(&output, &catalog) {
            Ok(()) => info!(path = %output.display(), entries = described, "catalog saved"),
            Err(err) => error!(path = %output.display(), error = %err, "failed to write catalog"),
        }

        Ok(CategoryOutcome {
            tool_name: spec.tool_name,
            folder,
            output,
            described,
        })
    }

    fn describe_file(&self, path: &Path) -> String {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.generator.generate(Some(SYSTEM_PROMPT), &description_prompt(&filename)) {
            Ok(description) => description.trim().to_string(),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "description failed");
                format!("Error: {err}")
            }
        }
    }
}

fn asset_files(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_valid_extension(path))
        .collect()
}

pub fn has_valid_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| VALID_EXTENSIONS.contains(&ext.as_str()))
}

fn description_prompt(filename: &str) -> String {
    format!(
        "I want you to generate a detailed, elaborated description of the given file.
Follow these rules:

1. Understand what the asset could represent (icon, logo, newsletter, PPT, branding file, etc.).
2. Explain its purpose and potential use in design/branding.
3. If the filename suggests a color gradient (e.g., red, white, blue), describe the color scheme.
4. If it's an image, describe what it visually represents (symbol, shape, object).
5. If it's a document (ppt, branding guideline, etc.), explain what kind of content might be inside.
6. Output in a human-friendly sentence or two, not just repeating the file name.

File to describe: {filename}
"
    )
}

fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let serialized = serde_json::to_string_pretty(catalog).context("failed to serialize catalog")?;
    fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))
}

fn append_master_log(path: &Path, lines: &[String]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    writeln!(file, "{}", lines.join("\n")).context("failed to append master log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_catalog;
    use crate::generation::GenerationError;
    use tempfile::tempdir;

    struct EchoGenerator;

    impl TextGenerator for EchoGenerator {
        fn generate(&self, system: Option<&str>, prompt: &str) -> Result<String, GenerationError> {
            assert_eq!(system, Some(SYSTEM_PROMPT));
            let name = prompt
                .lines()
                .find_map(|line| line.strip_prefix("File to describe: "))
                .unwrap_or("?");
            if name.contains("broken") {
                return Err(GenerationError::EmptyResponse);
            }
            Ok(format!("  A design asset named {name}.\n"))
        }
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(has_valid_extension(Path::new("a/Logo.SVG")));
        assert!(has_valid_extension(Path::new("deck.pptx")));
        assert!(!has_valid_extension(Path::new("notes.txt")));
        assert!(!has_valid_extension(Path::new("README")));
    }

    #[test]
    fn writes_catalogs_and_master_log() {
        let root = tempdir().expect("root");
        let out = tempdir().expect("out");
        let icons = root.path().join("Icon repository");
        fs::create_dir_all(icons.join("nested")).expect("mkdir");
        fs::write(icons.join("red_gradient.png"), b"png").expect("write");
        fs::write(icons.join("nested/blue.svg"), b"svg").expect("write");
        fs::write(icons.join("notes.txt"), b"skip").expect("write");
        fs::write(icons.join("broken.gif"), b"gif").expect("write");
        let master_log = root.path().join("master.txt");

        let job = DescribeJob {
            root: root.path(),
            output_dir: out.path(),
            master_log: &master_log,
            generator: &EchoGenerator,
        };
        let outcomes = job.run().expect("run");
        assert_eq!(outcomes.len(), 5);

        let catalog = load_catalog(&out.path().join("icon_repository.json")).expect("catalog");
        let keys: Vec<String> = catalog.keys().cloned().collect();
        assert_eq!(
            keys,
            [
                icons.join("broken.gif").display().to_string(),
                icons.join("nested/blue.svg").display().to_string(),
                icons.join("red_gradient.png").display().to_string(),
            ]
        );
        assert_eq!(
            catalog[&icons.join("red_gradient.png").display().to_string()],
            "A design asset named red_gradient.png."
        );
        assert_eq!(
            catalog[&icons.join("broken.gif").display().to_string()],
            "Error: generation service returned no content"
        );

        assert!(root.path().join("PPT Repository").is_dir());
        let empty = load_catalog(&out.path().join("ppt_repository.json")).expect("catalog");
        assert!(empty.is_empty());

        let log = fs::read_to_string(&master_log).expect("log");
        assert_eq!(log.lines().count(), 5);
        assert!(log.contains("icon_repository.json"));
    }

    #[test]
    fn master_log_is_appended() {
        let root = tempdir().expect("root");
        let out = tempdir().expect("out");
        let master_log = root.path().join("master.txt");
        fs::write(&master_log, "previous run\n").expect("write");

        let job = DescribeJob {
            root: root.path(),
            output_dir: out.path(),
            master_log: &master_log,
            generator: &EchoGenerator,
        };
        job.run().expect("run");

        let log = fs::read_to_string(&master_log).expect("log");
        assert!(log.starts_with("previous run\n"));
        assert_eq!(log.lines().count(), 6);
    }
}
