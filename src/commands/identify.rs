use anyhow::Result;
use citex::cite::identify;

use crate::cli::IdentifyArgs;

pub fn run_identify(args: IdentifyArgs) -> Result<()> {
    println!("{}", identify(&args.author, &args.date, &args.title));
    Ok(())
}
