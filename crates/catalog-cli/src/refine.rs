//! The `refine` command: raw catalog file in, canonical catalog and
//! diagnostics report out.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use catalog_core::{PipelineConfig, Vocabulary};
use catalog_runtime::{Orchestrator, RunError, RunReport};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Parsed `refine` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub vocabulary: Option<PathBuf>,
}

impl RefineArgs {
    /// Parse everything after the `refine` subcommand.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut positional = Vec::new();
        let mut config = None;
        let mut vocabulary = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = iter.next().context("--config needs a path")?;
                    config = Some(PathBuf::from(path));
                }
                "--vocabulary" | "-v" => {
                    let path = iter.next().context("--vocabulary needs a path")?;
                    vocabulary = Some(PathBuf::from(path));
                }
                flag if flag.starts_with('-') => bail!("unknown option: {}", flag),
                path => positional.push(PathBuf::from(path)),
            }
        }

        let mut positional = positional.into_iter();
        let (Some(input), Some(output), None) = (positional.next(), positional.next(), positional.next())
        else {
            bail!("expected <input> and <output> paths");
        };

        Ok(Self {
            input,
            output,
            config,
            vocabulary,
        })
    }

    /// `<output>.diagnostics.json` next to the output file.
    pub fn diagnostics_path(&self) -> PathBuf {
        let mut name = self.output.as_os_str().to_owned();
        name.push(".diagnostics.json");
        PathBuf::from(name)
    }
}

/// Outcome of a `refine` invocation.
#[derive(Debug)]
pub struct RefineSummary {
    pub report: RunReport,
    /// Set when the translation service went down mid-run.
    pub outage: Option<String>,
}

impl RefineSummary {
    pub fn succeeded(&self) -> bool {
        self.outage.is_none() && !self.report.cancelled
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosticsFile<'a> {
    #[serde(flatten)]
    report: &'a RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    outage: Option<&'a str>,
}

/// Run the pipeline over the input file and write both output files.
///
/// Products and diagnostics are written even when the run stopped early, so
/// the completed part is never lost.
pub async fn run(args: &RefineArgs, cancel: CancellationToken) -> anyhow::Result<RefineSummary> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    }
    .from_env();
    let vocabulary = match &args.vocabulary {
        Some(path) => Vocabulary::load(path)?,
        None => Vocabulary::default(),
    };

    let records = read_records(&args.input)?;
    info!("Read {} records from {}", records.len(), args.input.display());

    let translator = catalog_translate::create_translator(&config.translation);
    let orchestrator = Orchestrator::from_config(&vocabulary, &config, translator)?;

    let (report, outage) = match orchestrator.run_json(records, cancel).await {
        Ok(report) => (report, None),
        Err(err @ RunError::ServiceUnavailable { .. }) => {
            error!("{}", err);
            let reason = err.to_string();
            (err.into_report(), Some(reason))
        }
    };

    write_json(&args.output, &report.products)?;
    let diagnostics = DiagnosticsFile {
        report: &report,
        outage: outage.as_deref(),
    };
    write_json(&args.diagnostics_path(), &diagnostics)?;
    info!(
        "Wrote {} products to {} and diagnostics to {}",
        report.products.len(),
        args.output.display(),
        args.diagnostics_path().display()
    );

    Ok(RefineSummary { report, outage })
}

fn read_records(path: &Path) -> anyhow::Result<Vec<Value>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    match value {
        Value::Array(records) => Ok(records),
        _ => bail!("{} must hold a JSON array of products", path.display()),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Print a human-readable run summary to stdout.
pub fn print_report(summary: &RefineSummary) {
    let report = &summary.report;
    println!("Run {}", report.run_id);
    println!("  Records:   {}", report.total);
    println!("  Accepted:  {}", report.accepted);
    println!("  Rejected:  {}", report.rejected);
    println!("  Categories: {}", report.categories.len());
    if report.skipped > 0 {
        println!("  Skipped:   {}", report.skipped);
    }
    let flagged = report
        .diagnostics
        .iter()
        .filter(|d| !d.translation_failures.is_empty())
        .count();
    if flagged > 0 {
        println!("  Partially translated: {}", flagged);
    }
    if report.cancelled {
        println!("  Run was cancelled");
    }
    if let Some(reason) = &summary.outage {
        println!("  Stopped: {}", reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = RefineArgs::parse(&args(&["raw.json", "out/products.json", "--config", "p.json"])).unwrap();
        assert_eq!(parsed.input, PathBuf::from("raw.json"));
        assert_eq!(parsed.config, Some(PathBuf::from("p.json")));
        assert!(parsed.vocabulary.is_none());
        assert_eq!(
            parsed.diagnostics_path(),
            PathBuf::from("out/products.json.diagnostics.json")
        );

        assert!(RefineArgs::parse(&args(&["raw.json"])).is_err());
        assert!(RefineArgs::parse(&args(&["a", "b", "c"])).is_err());
        assert!(RefineArgs::parse(&args(&["a", "b", "--fast"])).is_err());
        assert!(RefineArgs::parse(&args(&["a", "b", "--config"])).is_err());
    }

    #[tokio::test]
    async fn test_refine_writes_products_and_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rawdata.json");
        let raw = json!([
            {
                "id": "1001",
                "title": "Camping Lantern",
                "description": "<p>Bright LED lantern.</p><p>Weight: 350 g</p>",
                "vendor": "NoEnName_Null",
                "status": "ACTIVE",
                "images": ["https://cdn/a.jpg"],
                "variants": [{"id": 1, "title": "Black", "price": "49.90", "inventory": 2}],
                "price": "49.90",
                "currency": "ILS"
            },
            {"id": "1002", "title": "Broken", "status": "active"}
        ]);
        std::fs::write(&input, serde_json::to_string(&raw).unwrap()).unwrap();

        let refine_args = RefineArgs {
            input,
            output: dir.path().join("out").join("products.json"),
            config: None,
            vocabulary: None,
        };
        let summary = run(&refine_args, CancellationToken::new()).await.unwrap();
        assert!(summary.succeeded());
        assert_eq!(summary.report.accepted, 1);
        assert_eq!(summary.report.rejected, 1);

        let products: Value =
            serde_json::from_str(&std::fs::read_to_string(&refine_args.output).unwrap()).unwrap();
        assert_eq!(products.as_array().unwrap().len(), 1);
        assert_eq!(products[0]["productId"], "1001");
        assert_eq!(products[0]["brand"], "Unknown");
        assert_eq!(products[0]["weight"]["unit"], "g");

        let diagnostics: Value = serde_json::from_str(
            &std::fs::read_to_string(refine_args.diagnostics_path()).unwrap(),
        )
        .unwrap();
        assert_eq!(diagnostics["accepted"], 1);
        assert_eq!(diagnostics["diagnostics"][1]["rejection"]["kind"], "malformed_input");
        assert!(diagnostics.get("outage").is_none());
        let categories = diagnostics["categories"].as_object().unwrap();
        assert_eq!(categories.len(), 1);
        assert!(categories.values().all(|subs| subs.as_array().unwrap().len() == 1));
    }

    #[tokio::test]
    async fn test_refine_rejects_non_array_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rawdata.json");
        std::fs::write(&input, r#"{"products": []}"#).unwrap();
        let refine_args = RefineArgs {
            input,
            output: dir.path().join("products.json"),
            config: None,
            vocabulary: None,
        };
        assert!(run(&refine_args, CancellationToken::new()).await.is_err());
    }
}
