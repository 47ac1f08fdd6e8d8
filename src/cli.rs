//! CLI: infer → (schema | generate)
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::{info, warn};

use json_classgen::codegen::{self, CodeWriter, RustWriter, TypeScriptWriter};
use json_classgen::jq_exec::run_jaq;
use json_classgen::{infer_batch, Config, Error, Inference};

const STDIN: &str = "-";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer class definitions from JSON/NDJSON samples and print the type model or generated source
#[derive(Parser, Debug)]
#[command(name = "json-classgen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer and print the type model as JSON
    Schema(SchemaOut),
    /// infer and emit class definitions for a target language
    Generate(GenerateOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one sample
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct ModelSettings {
    /// JSON configuration file; the flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// name of the top-level type
    #[arg(long)]
    root_type: Option<String>,

    /// namespace wrapping the root type
    #[arg(long)]
    namespace: Option<String>,

    /// namespace for every other type
    #[arg(long)]
    secondary_namespace: Option<String>,

    /// keep observed values and render them as doc comments
    #[arg(long)]
    examples: bool,

    /// internal instead of exported/public types
    #[arg(long)]
    internal: bool,

    /// accessor methods instead of public fields
    #[arg(long)]
    properties: bool,

    /// never classify objects as string-keyed maps
    #[arg(long)]
    no_dictionaries: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    model_settings: ModelSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    model_settings: ModelSettings,

    /// target language
    #[arg(long, value_enum, default_value_t = Language::Typescript)]
    lang: Language,

    /// output file (stdout if omitted)
    #[arg(short, long, conflicts_with = "separate")]
    out: Option<PathBuf>,

    /// infer every input file on its own, in parallel, one output file each
    #[arg(long, requires = "out_dir")]
    separate: bool,

    /// output directory for --separate
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    Typescript,
    Rust,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Language {
    fn writer(self) -> &'static dyn CodeWriter {
        match self {
            Language::Typescript => &TypeScriptWriter,
            Language::Rust => &RustWriter,
        }
    }
}

impl InputSettings {
    /// Every sample document, grouped by the input it came from.
    fn load_sources(&self) -> anyhow::Result<Vec<(PathBuf, Vec<Value>)>> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        source_paths
            .into_iter()
            .map(|path| {
                let documents = self.load_file(&path)?;
                Ok((path, documents))
            })
            .collect()
    }

    fn load_file(&self, path: &Path) -> anyhow::Result<Vec<Value>> {
        let origin = path.display().to_string();
        let source = read_source(path)?;

        let parsed = if self.ndjson {
            source
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(index, line)| parse_document(&format!("{origin}:{}", index + 1), line))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![parse_document(&origin, &source)?]
        };

        let mut documents = Vec::with_capacity(parsed.len());
        for document in parsed {
            let selected = match self.json_pointer.as_deref() {
                None => document,
                Some(pointer) => match document.pointer(pointer) {
                    Some(node) => node.clone(),
                    None => {
                        warn!(origin = %origin, pointer, "JSON pointer matched nothing; document skipped");
                        continue;
                    }
                },
            };
            match self.jq_expr.as_deref() {
                None => documents.push(selected),
                Some(jq_expr) => {
                    let outputs = run_jaq(jq_expr, &selected)
                        .with_context(|| format!("failed to apply jq expression to {origin}"))?;
                    documents.extend(outputs);
                }
            }
        }
        info!(origin = %origin, documents = documents.len(), "loaded input");
        Ok(documents)
    }
}

impl ModelSettings {
    fn resolve(&self) -> anyhow::Result<Config> {
        let mut config = match self.config.as_deref() {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(root_type) = &self.root_type {
            ensure!(!root_type.trim().is_empty(), "--root-type must not be empty");
            config.root_name = root_type.clone();
        }
        if self.namespace.is_some() {
            config.namespace = self.namespace.clone();
        }
        if self.secondary_namespace.is_some() {
            config.secondary_namespace = self.secondary_namespace.clone();
        }
        config.examples_in_documentation |= self.examples;
        config.internal_visibility |= self.internal;
        config.use_properties |= self.properties;
        if self.no_dictionaries {
            config.dictionaries.enabled = false;
        }
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let config = target.model_settings.resolve()?;
                let sources = target.input_settings.load_sources()?;

                let mut inference = Inference::new(&config);
                for (_, documents) in &sources {
                    documents.iter().for_each(|document| inference.observe_value(document));
                }
                let model = inference.solve();

                let schema_src = serde_json::to_string_pretty(&model)?;
                write_output(target.out.as_deref(), &schema_src)
            }
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let config = target.model_settings.resolve()?;
                let writer = target.lang.writer();
                let sources = target.input_settings.load_sources()?;

                if target.separate {
                    let out_dir = target.out_dir.as_deref().context("--separate requires --out-dir")?;
                    let (paths, sets): (Vec<PathBuf>, Vec<Vec<Value>>) = sources.into_iter().unzip();
                    let models = infer_batch(&sets, &config);
                    for (path, model) in paths.iter().zip(&models) {
                        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or("stdin".into());
                        let out = out_dir.join(format!("{stem}.{}", writer.file_extension()));
                        let source = codegen::render(writer, model, &config)?;
                        write_output(Some(&out), &source)?;
                        info!(path = %out.display(), classes = model.classes().len(), "wrote {}", writer.display_name());
                    }
                    return Ok(());
                }

                let mut inference = Inference::new(&config);
                for (_, documents) in &sources {
                    documents.iter().for_each(|document| inference.observe_value(document));
                }
                let model = inference.solve();
                let source = codegen::render(writer, &model, &config)?;
                write_output(target.out.as_deref(), &source)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_source(path: &Path) -> Result<String, Error> {
    let io_error = |source| Error::Io { path: path.to_path_buf(), source };
    if path.as_os_str() == STDIN {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source).map_err(io_error)?;
        return Ok(source);
    }
    std::fs::read_to_string(path).map_err(io_error)
}

fn parse_document(origin: &str, source: &str) -> Result<Value, Error> {
    serde_json::from_str(source).map_err(|source| Error::MalformedInput { origin: origin.to_string(), source })
}

fn write_output(out: Option<&Path>, source: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, source).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{source}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
            ensure!(!matched.is_empty(), "glob pattern matched no files: {pattern}");
            // glob order is platform dependent; names depend on input order
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(extra: &[&str]) -> GenerateOut {
        let mut args = vec!["generate", "--input", "a.json"];
        args.extend_from_slice(extra);
        let cli = CommandLineInterface::parse_from(std::iter::once("json-classgen").chain(args));
        match cli.cmd {
            Command::Generate(target) => target,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_config_defaults() {
        let target = settings(&["--lang", "rust", "--root-type", "Payload", "--namespace", "Api", "--examples"]);
        assert_eq!(target.lang, Language::Rust);
        let config = target.model_settings.resolve().unwrap();
        assert_eq!(config.root_name, "Payload");
        assert_eq!(config.namespace.as_deref(), Some("Api"));
        assert!(config.examples_in_documentation);
        assert!(config.dictionaries.enabled);
    }

    #[test]
    fn separate_requires_an_output_directory() {
        let result = CommandLineInterface::try_parse_from(["json-classgen", "generate", "-i", "a.json", "--separate"]);
        assert!(result.is_err());
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "-"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("-")]);
    }

    #[test]
    fn ndjson_pointer_and_jq_select_documents() {
        let dir = std::env::temp_dir().join(format!("json-classgen-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("samples.ndjson");
        std::fs::write(&file, "{\"data\": {\"items\": [1, 2]}}\n\n{\"data\": {\"items\": [3]}}\n{\"other\": 1}\n").unwrap();

        let input = InputSettings {
            ndjson: true,
            json_pointer: Some("/data".into()),
            jq_expr: Some(".items[]".into()),
            input: vec![file.to_string_lossy().into_owned()],
        };
        let sources = input.load_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].1, vec![Value::from(1), Value::from(2), Value::from(3)]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
