use clap::{Args, Parser, Subcommand};
use contextify::config::Config;
use contextify::scope::{FocusArea, ScopingDirectives, DEFAULT_MAX_FILES};

#[derive(Parser)]
#[command(name = "contextify")]
#[command(
    about = "Scopes a repository into a bounded, relevance-ranked context bundle for LLM prompts",
    long_about = None
)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Log scoping decisions to stderr")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print the context bundle for a request")]
    Scope(ScopeArgs),

    #[command(about = "Show the selected files with their roles")]
    Tree(TreeArgs),

    #[command(about = "Show the detected stack and environment constraints")]
    Profile(ProfileArgs),
}

/// Flags that shape which files are selected.
#[derive(Args, Debug, Default)]
pub struct ScopeFlags {
    #[arg(short, long, help = "Project path (default: current directory)")]
    pub path: Option<String>,

    #[arg(
        long,
        help = "Restrict to an area: frontend, backend, database, config, tests"
    )]
    pub focus: Option<FocusArea>,

    #[arg(short, long, help = "Only files with uncommitted changes")]
    pub changed: bool,

    #[arg(short, long, help = "Also include files with staged or unstaged edits")]
    pub git_aware: bool,

    #[arg(long, help = "File the request is about, relative to the project path")]
    pub target: Option<String>,

    #[arg(long, help = "Only the target and the files it imports")]
    pub tree_shake: bool,

    #[arg(long, help = "Render non-target files as signatures only")]
    pub skeleton_context: bool,

    #[arg(long, help = "Function inside the target the change is limited to")]
    pub scope_function: Option<String>,

    #[arg(short, long, help = "Maximum number of files (default: 30)")]
    pub max_files: Option<usize>,

    #[arg(short, long, help = "Extra glob to exclude (repeatable)")]
    pub exclude: Vec<String>,
}

impl ScopeFlags {
    pub fn root(&self) -> &str {
        self.path.as_deref().unwrap_or(".")
    }

    /// Config values fill in whatever the command line left unset; excludes
    /// from both sources are combined.
    pub fn directives(&self, config: &Config) -> ScopingDirectives {
        let mut extra_exclude_globs = config.exclude.clone().unwrap_or_default();
        extra_exclude_globs.extend(self.exclude.iter().cloned());

        ScopingDirectives {
            focus_area: self.focus.unwrap_or_default(),
            changed_only: self.changed,
            git_aware: self.git_aware,
            target_path: self.target.clone(),
            tree_shake: self.tree_shake,
            skeleton_context: self.skeleton_context,
            scope_function: self.scope_function.clone(),
            max_files: self
                .max_files
                .or(config.max_files)
                .unwrap_or(DEFAULT_MAX_FILES),
            extra_exclude_globs,
        }
    }
}

#[derive(Parser)]
pub struct ScopeArgs {
    #[arg(help = "What you want the model to do")]
    pub request: Option<String>,

    #[command(flatten)]
    pub scope: ScopeFlags,

    #[arg(short, long, help = "Output format: text, json, xml (default: text)")]
    pub format: Option<String>,

    #[arg(short, long, help = "Show token counts")]
    pub tokens: bool,

    #[arg(long, help = "Leave out the detected stack")]
    pub no_style: bool,

    #[arg(long, help = "Pin framework and runtime versions from the manifests")]
    pub hard_lock: bool,

    #[arg(long, help = "Leave out constraints derived from the target path")]
    pub no_negative_context: bool,

    #[arg(
        short = 'j',
        long,
        help = "Number of parallel jobs for reading files (0 = auto)"
    )]
    pub jobs: Option<usize>,
}

#[derive(Parser)]
pub struct TreeArgs {
    #[command(flatten)]
    pub scope: ScopeFlags,

    #[arg(short, long, help = "Flat output instead of tree")]
    pub flat: bool,

    #[arg(long, help = "Disable colors")]
    pub no_color: bool,
}

#[derive(Parser)]
pub struct ProfileArgs {
    #[arg(short, long, help = "Project path (default: current directory)")]
    pub path: Option<String>,
}
