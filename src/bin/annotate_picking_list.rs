//! Annotate a picking list with delivery-plan numbers
//!
//! Reads a picking-list PDF and a mapping CSV, appends the delivery-plan
//! column to every page and writes the result.
//!
//! Usage:
//!   annotate_picking_list <picking-list.pdf> <mapping.csv>
//!   annotate_picking_list list.pdf plan.csv -o annotated.pdf --font NotoSansJP.ttf
//!
//! Options:
//!   -o, --output <PATH>   Output file (default: TMP1_納品プランNo追記済_<timestamp>.pdf)
//!   --font <TTF>          Embed this TrueType font instead of the predefined one
//!   --table-right         Start the column at the template's table edge
//!   --json                Print the summary as JSON
//!   -v, --verbose         Debug logging

use picklist_annotator::{MergeConfig, PickingListMerger};
use std::path::PathBuf;
use std::process::ExitCode;

struct CliArgs {
    pdf: PathBuf,
    csv: PathBuf,
    output: Option<PathBuf>,
    font: Option<PathBuf>,
    table_right: bool,
    json: bool,
    verbose: bool,
}

const USAGE: &str = "Usage: annotate_picking_list <picking-list.pdf> <mapping.csv> \
                     [-o OUT] [--font TTF] [--table-right] [--json] [-v]";

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut positional = Vec::new();
        let mut output = None;
        let mut font = None;
        let mut table_right = false;
        let mut json = false;
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-o" | "--output" => {
                    let value = args.next().ok_or("--output needs a path")?;
                    output = Some(PathBuf::from(value));
                },
                "--font" => {
                    let value = args.next().ok_or("--font needs a path")?;
                    font = Some(PathBuf::from(value));
                },
                "--table-right" => table_right = true,
                "--json" => json = true,
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => return Err(String::new()),
                s if s.starts_with('-') => return Err(format!("unknown option {}", s)),
                _ => positional.push(PathBuf::from(&arg)),
            }
        }

        let [pdf, csv]: [PathBuf; 2] = positional
            .try_into()
            .map_err(|_| "expected a PDF and a CSV path".to_string())?;

        Ok(Self {
            pdf,
            csv,
            output,
            font,
            table_right,
            json,
            verbose,
        })
    }
}

fn default_output_name() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("TMP1_納品プランNo追記済_{}.pdf", stamp))
}

fn run(args: CliArgs) -> picklist_annotator::Result<()> {
    let pdf = std::fs::read(&args.pdf)?;
    let csv = std::fs::read(&args.csv)?;

    let mut config = MergeConfig::new().with_table_right_origin(args.table_right);
    if let Some(font) = &args.font {
        config = config.with_font_path(font);
    }

    let output = PickingListMerger::new(config).merge(&pdf, &csv)?;
    let path = args.output.unwrap_or_else(default_output_name);
    std::fs::write(&path, &output.pdf)?;

    if args.json {
        let report = serde_json::json!({
            "output": path.display().to_string(),
            "mapping_entries": output.mapping_entries,
            "mapping_encoding": output.mapping_encoding.map(|e| e.name()),
            "summary": output.summary,
        });
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        println!("Mapping entries: {}", output.mapping_entries);
        println!("Matched {}/{} rows", output.summary.matched_rows, output.summary.total_rows);
        if !output.summary.unmatched_ids.is_empty() {
            println!("Not found ({}):", output.summary.unmatched_ids.len());
            for id in &output.summary.unmatched_ids {
                println!("  {}", id);
            }
        }
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("Error: {}", msg);
            }
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        },
    };

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
