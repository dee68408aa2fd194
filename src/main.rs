use anyhow::{bail, Context};
use paintkit::{init_logging, load_job, run_job, LineSink, OutputFormat};
use std::io::Write;
use std::path::PathBuf;

const USAGE: &str = "Usage: paintkit [--json] <scene.json> [config.(json|toml)]";

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let mut format = OutputFormat::Text;
    let mut files = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => format = OutputFormat::Json,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => files.push(PathBuf::from(arg)),
        }
    }
    let (scene, config) = match files.as_slice() {
        [scene] => (scene, None),
        [scene, config] => (scene, Some(config.as_path())),
        _ => bail!(USAGE),
    };

    let (config, paths) = load_job(scene, config)?;
    let stdout = std::io::stdout();
    let mut sink = LineSink::new(stdout.lock(), format);
    let ticks = run_job(config, paths, &mut sink)?;
    tracing::info!("{} primitives in {} ticks", sink.written(), ticks);
    sink.into_inner().flush().context("Failed to flush output")?;
    Ok(())
}
