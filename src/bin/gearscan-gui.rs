use clap::Parser;

use gearscan::args::{ModelArgs, init_logging};

#[derive(Parser)]
#[command(name = "gearscan-gui")]
#[command(about = "Desktop viewer for gear defect detection")]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.model.log_level());
    gearscan::gui::run(args.model.detector_config())?;
    Ok(())
}
