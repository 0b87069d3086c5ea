use super::{fail, load_manifest, print_warnings, ManifestArgs};

pub fn cmd_check(args: ManifestArgs) {
    let loaded = load_manifest(&args);
    match skepu_codegen::check_manifest(&loaded.source, &loaded.options) {
        Ok(warnings) => {
            print_warnings(&warnings, &loaded.filename, &loaded.source);
            eprintln!("OK: {}", args.manifest.display());
        }
        Err(e) => fail(e, &loaded.filename, &loaded.source),
    }
}
