use clap::builder::FalseyValueParser;
use clap::Parser;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Tagged builds report the tag alone
    if let Some(tag) = option_env!("SETUP_HUGO_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("SETUP_HUGO_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("SETUP_HUGO_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup; clap needs a 'static str
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

/// Every input can also be bound from the GitHub Actions `INPUT_<NAME>`
/// variable, so the binary works unchanged as an action step.
#[derive(Debug, Parser)]
#[command(name = "setup-hugo")]
#[command(about = "Installs Hugo and Dart Sass from GitHub Releases")]
#[command(version = get_version())]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Token for GitHub API requests (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Hugo release tag to install, or 'latest'
    #[arg(long, env = "INPUT_HUGO-VERSION")]
    pub hugo_version: Option<String>,

    /// Install the extended build of Hugo
    #[arg(long, env = "INPUT_EXTENDED", value_parser = FalseyValueParser::new())]
    pub extended: bool,

    /// Install the extended build with deploy support (implies --extended)
    #[arg(long, env = "INPUT_WITH-DEPLOY", value_parser = FalseyValueParser::new())]
    pub with_deploy: bool,

    /// Also install Dart Sass
    #[arg(long, env = "INPUT_DART-SASS", value_parser = FalseyValueParser::new())]
    pub dart_sass: bool,

    /// Dart Sass release tag to install, or 'latest'
    #[arg(long, env = "INPUT_DART-SASS-VERSION")]
    pub dart_sass_version: Option<String>,
}

impl Cli {
    pub fn token(&self) -> Option<String> {
        resolve_token(self.github_token.clone(), std::env::var("GITHUB_TOKEN").ok())
    }
}

/// Runners export declared but unset inputs as empty strings, so blank values
/// are dropped before falling back.
fn resolve_token(input: Option<String>, fallback: Option<String>) -> Option<String> {
    let non_blank = |t: &String| !t.trim().is_empty();
    input.filter(non_blank).or_else(|| fallback.filter(non_blank))
}
