use skepu_codegen::descriptor::skeleton::SKELETONS;

pub fn cmd_skeletons() {
    println!("{:<20} {:<16} {:>9} {:>8}", "TEMPLATE", "SKELETON", "FUNCTIONS", "KERNELS");
    for (template, skeleton) in SKELETONS {
        println!(
            "{:<20} {:<16} {:>9} {:>8}",
            template, skeleton.name, skeleton.userfunction_args, skeleton.device_kernels
        );
    }
}
