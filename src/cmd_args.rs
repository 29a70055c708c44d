use clap::Parser;
use clap_complete::Shell;

/// run one forward pass of the aggregation model over a graph
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// extra config files or glob patterns, merged after configs/default.toml
    pub config_names: Vec<String>,

    /// print the shell completion script and exit
    #[clap(long, arg_enum)]
    pub generator: Option<Shell>,
}

/// # Description
/// expand the glob patterns of the config names, in order
/// - a name without any match is kept as is, so the config loader reports it
pub fn expand_config_names(names: &[String]) -> Result<Vec<String>, glob::PatternError> {
    let mut expanded = Vec::new();
    for name in names {
        let mut matches: Vec<String> = glob::glob(name)?
            .filter_map(|entry| entry.ok())
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        if matches.is_empty() {
            expanded.push(name.clone());
        } else {
            matches.sort();
            expanded.append(&mut matches);
        }
    }
    Ok(expanded)
}
