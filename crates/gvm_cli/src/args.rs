use gvm_runtime::RuntimeConfig;

pub(crate) struct CliArgs {
    pub cmd: String,
    pub seed: Option<u64>,
    pub heap_words: Option<usize>,
    pub quantum: Option<usize>,
    pub typed_channels: bool,
    pub positional: Vec<String>,
}

impl CliArgs {
    pub(crate) fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(words) = self.heap_words {
            config.heap_words = words;
        }
        if let Some(q) = self.quantum {
            config.max_quantum = q;
        }
        config.typed_channels = self.typed_channels;
        config
    }
}

pub(crate) fn usage() -> &'static str {
    "Usage: gvm <run|exec|compile|dump> [seed=<n>] [heap=<words>] [quantum=<n>] [typed-chans] <file>"
}

fn parse_value<T: std::str::FromStr>(key: &str, v: &str) -> Result<T, String> {
    v.parse::<T>().map_err(|_| format!("Invalid value for {key}: {v}"))
}

pub(crate) fn parse_args() -> Result<CliArgs, String> {
    parse_from(std::env::args().skip(1).collect())
}

fn parse_from(mut argv: Vec<String>) -> Result<CliArgs, String> {
    if argv.is_empty() {
        return Err(usage().to_string());
    }
    let cmd = argv.remove(0);

    let mut seed = None;
    let mut heap_words = None;
    let mut quantum = None;
    let mut typed_channels = false;
    let mut positional: Vec<String> = Vec::new();

    for a in argv {
        if a.starts_with("--") {
            return Err(format!("Unknown option: {a}"));
        }
        if let Some(v) = a.strip_prefix("seed=") {
            seed = Some(parse_value("seed", v)?);
        } else if let Some(v) = a.strip_prefix("heap=") {
            heap_words = Some(parse_value("heap", v)?);
        } else if let Some(v) = a.strip_prefix("quantum=") {
            quantum = Some(parse_value("quantum", v)?);
        } else if a == "typed-chans" {
            typed_channels = true;
        } else {
            positional.push(a);
        }
    }

    Ok(CliArgs {
        cmd,
        seed,
        heap_words,
        quantum,
        typed_channels,
        positional,
    })
}
