use std::path::PathBuf;
use std::process;

use clap::Args;
use tracing::info;

use super::{fail, load_manifest, print_warnings, ManifestArgs};

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,
    /// Write a JSON report of the generated files
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn cmd_generate(args: GenerateArgs) {
    let loaded = load_manifest(&args.manifest);
    let options = &loaded.options;

    let backends: Vec<String> = options.backends.iter().map(|b| b.to_string()).collect();
    info!(
        "generating {} for {}",
        options.main_file().display(),
        if backends.is_empty() {
            "sequential CPU only".to_string()
        } else {
            backends.join(", ")
        }
    );

    let (report, warnings) = match skepu_codegen::generate_from_manifest(&loaded.source, options) {
        Ok(r) => r,
        Err(e) => fail(e, &loaded.filename, &loaded.source),
    };
    print_warnings(&warnings, &loaded.filename, &loaded.source);

    for kernel in &report.kernels {
        println!("{} {}", kernel.backend, kernel.path.display());
    }
    println!("host {}", report.host_unit.display());
    eprintln!(
        "Generated {} kernel(s), {} file(s) changed",
        report.kernel_names().len(),
        report.written()
    );

    if let Some(path) = args.report {
        let json = match report.to_json() {
            Ok(j) => j,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(&path, json) {
            eprintln!("error: cannot write '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}
