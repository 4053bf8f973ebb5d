use anyhow::{Result, bail};
use clap::Args;

use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct ValidateArg {
    /// Decoded code texts
    #[arg(required = true)]
    texts: Vec<String>,
}

pub fn validate(arg: ValidateArg, config: &Config) -> Result<()> {
    let validator = config.validator();
    let mut rejected = 0usize;
    for text in &arg.texts {
        match validator.validate(text) {
            Ok(reference) => println!(
                "ok\t{}\t{:?}\t{}",
                reference.format, reference.origin, reference.uri
            ),
            Err(e) => {
                rejected += 1;
                println!("rejected\t{e}\t{text}");
            }
        }
    }
    if rejected > 0 {
        bail!("{rejected} of {} payloads rejected", arg.texts.len());
    }
    Ok(())
}
