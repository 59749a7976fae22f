use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "smalruby-rs",
    about = "Convert Scratch 3 sprite and stage state (.sb3 or project.json) into Smalruby source."
)]
pub struct Args {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "NAME", help = "Emit only the target with this name.")]
    pub target: Option<String>,

    #[arg(
        long,
        conflicts_with = "stdout",
        help = "Write one .rb file per target into OUTPUT (a directory)."
    )]
    pub split_targets: bool,

    #[arg(long, help = "Print the generated source instead of writing a file.")]
    pub stdout: bool,
}
