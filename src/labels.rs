use clap::Parser;
use log::{error, info};

use headmerge::audit::audit_labels;
use headmerge::LabelArgs;

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = LabelArgs::parse();

    info!("Checking labels in {}", args.annotations_dir.display());

    match audit_labels(&args.annotations_dir, args.expected.as_deref()) {
        Ok(audit) => {
            audit.print_summary();
            if audit.files_with_issues() == 0 {
                info!("All annotations look consistent.");
            }
        }
        Err(e) => error!("Failed to audit labels: {}", e),
    }
}
