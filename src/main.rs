mod args;

use scn_tool::pipeline;
use scn_tool::types;
use scn_tool::utils;
use scn_tool::COUNTER;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_policy(arg: &args::Arg) -> anyhow::Result<types::ScnPolicy> {
    match &arg.policy {
        Some(path) => {
            let data = utils::files::read_file(path)?;
            let policy = serde_json::from_slice(&data)
                .map_err(|e| anyhow::anyhow!("Invalid policy file {}: {}", path, e))?;
            Ok(policy)
        }
        None => Ok(types::ScnPolicy::default()),
    }
}

fn report_error(arg: &args::Arg, action: &str, filename: &str, e: &anyhow::Error) {
    tracing::error!("Error {} {}: {}", action, filename, e);
    if arg.backtrace {
        eprintln!("Backtrace: {}", e.backtrace());
    }
    COUNTER.inc_error();
}

fn collect(path: &str, recursive: bool) -> anyhow::Result<(Vec<String>, bool)> {
    utils::files::collect_files(path, recursive)
        .map_err(|e| anyhow::anyhow!("Cannot list {}: {}", path, e))
}

fn run_extract(
    arg: &args::Arg,
    cfg: &types::ExtraConfig,
    scn: &str,
    translated_scn: &Option<String>,
    output: &str,
) -> anyhow::Result<()> {
    let mut existing = types::LineMap::new();
    if let Some(translated) = translated_scn {
        let (scripts, _) = collect(translated, arg.recursive)?;
        for script in scripts.iter() {
            if let Err(e) = pipeline::collect_translations(script, arg.encoding, cfg, &mut existing)
            {
                report_error(arg, "reading", script, &e);
            }
        }
    }
    let (scripts, _) = collect(scn, arg.recursive)?;
    let mut records = Vec::new();
    for script in scripts.iter() {
        match pipeline::extract_file(script, arg.encoding, cfg, &existing) {
            Ok(mut r) => {
                COUNTER.inc(if r.is_empty() {
                    types::ScriptResult::Ignored
                } else {
                    types::ScriptResult::Ok
                });
                records.append(&mut r);
            }
            Err(e) => report_error(arg, "extracting", script, &e),
        }
    }
    tracing::info!("Writing {} records to {}", records.len(), output);
    pipeline::write_table(&records, output)
}

fn run_patch(
    arg: &args::Arg,
    cfg: &types::ExtraConfig,
    scn: &str,
    records: &str,
    output: &str,
    reference: Option<&str>,
) -> anyhow::Result<()> {
    let (scripts, is_dir) = collect(scn, arg.recursive)?;
    if is_dir {
        let op = std::path::Path::new(output);
        if op.exists() {
            if !op.is_dir() {
                return Err(anyhow::anyhow!("Output path is not a directory"));
            }
        } else {
            std::fs::create_dir_all(op)?;
        }
    }
    let data = utils::source::fetch(records)?;
    let table = scn_tool::output_scripts::csv::read_records(&data)?;
    let lines = pipeline::build_line_map(&table, pipeline::script_encoding(arg.encoding), cfg)?;
    tracing::info!("Loaded {} translated lines", lines.len());
    for script in scripts.iter() {
        match pipeline::patch_file(script, arg.encoding, cfg, &lines, output, is_dir, reference) {
            Ok(result) => COUNTER.inc(result),
            Err(e) => report_error(arg, "patching", script, &e),
        }
    }
    Ok(())
}

fn main() {
    let arg = args::parse_args();
    if arg.backtrace {
        unsafe { std::env::set_var("RUST_LIB_BACKTRACE", "1") };
    }
    init_logging(arg.verbose);
    let policy = match load_policy(&arg) {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let re = match &arg.command {
        args::Command::Extract {
            scn,
            translated_scn,
            output,
        } => {
            let cfg = types::ExtraConfig {
                policy,
                ..Default::default()
            };
            run_extract(&arg, &cfg, scn, translated_scn, output)
        }
        args::Command::Patch {
            scn,
            records,
            output,
            reference,
            width,
            keep_name_brackets,
        } => {
            let cfg = types::ExtraConfig {
                policy,
                wrap_width: *width,
                replace_name_brackets: !keep_name_brackets,
            };
            run_patch(&arg, &cfg, scn, records, output, reference.as_deref())
        }
    };
    if let Err(e) = re {
        tracing::error!("{}", e);
        if arg.backtrace {
            eprintln!("Backtrace: {}", e.backtrace());
        }
        eprintln!("{}", *COUNTER);
        std::process::exit(1);
    }
    if COUNTER.warnings() > 0 {
        tracing::warn!(
            "{} problems were skipped, output may need manual checks",
            COUNTER.warnings()
        );
    }
    eprintln!("{}", *COUNTER);
    if COUNTER.errors() > 0 {
        std::process::exit(1);
    }
}
