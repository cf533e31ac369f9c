//! Command-line demo: run OIL over a sample set and print the learned NFA.

use anyhow::Context;
use clap::{App, Arg};
use oil_core::{nfa_print, oil_with_options, SampleSet};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = App::new("oil-demo")
        .about("learn a fixed-capacity NFA from positive/negative samples")
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("PATH")
                .help("TOML sample-set file; defaults to a built-in demo set"),
        )
        .get_matches();

    let set = match matches.value_of("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path))?;
            SampleSet::from_toml_str(&text).with_context(|| format!("parsing config file {}", path))?
        }
        None => SampleSet::builtin_demo(),
    };

    let nfa = oil_with_options(
        &set.buffer,
        set.sample_length,
        set.alphabet_size,
        &set.positives,
        &set.negatives,
        set.options(),
        &mut rand::thread_rng(),
    );

    nfa_print(&nfa);
    Ok(())
}
