use crate::cli::{ProfileArgs, ScopeArgs, ScopeFlags, TreeArgs};
use contextify::bundle::{self, BundleOptions};
use contextify::config::{self, Config};
use contextify::constraints;
use contextify::content::LoadOptions;
use contextify::engine::{ScopeContext, ScopeOutcome};
use contextify::output::{self, text, OutputFormat};
use contextify::scope::ScopingDirectives;
use contextify::tree;
use std::error::Error;
use std::path::Path;

pub fn scope(args: ScopeArgs) -> Result<(), Box<dyn Error>> {
    let config = config::load_config(Path::new(args.scope.root()));
    let (ctx, directives, outcome) = run_engine(&args.scope, &config)?;

    let format: OutputFormat = match args.format.as_deref().or(config.format.as_deref()) {
        Some(f) => f.parse()?,
        None => OutputFormat::Text,
    };

    let options = BundleOptions {
        request: args.request,
        include_profile: !args.no_style,
        hard_lock: args.hard_lock,
        negative_context: !args.no_negative_context,
        load: LoadOptions {
            tokens: args.tokens || config.tokens.unwrap_or(false),
            jobs: args.jobs.or(config.jobs).unwrap_or(0),
        },
    };
    let bundle = bundle::build_bundle(ctx.root(), outcome, &directives, &options);
    print!("{}", output::render(&bundle, format)?);
    Ok(())
}

pub fn tree(args: TreeArgs) -> Result<(), Box<dyn Error>> {
    let config = config::load_config(Path::new(args.scope.root()));
    let (_, _, outcome) = run_engine(&args.scope, &config)?;
    let no_color = args.no_color || config.no_color.unwrap_or(false);

    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    if outcome.files.is_empty() {
        eprintln!("No files selected");
        return Ok(());
    }

    let rendered = if args.flat {
        tree::render_flat(&outcome.files, no_color)
    } else {
        tree::render_tree(&outcome.files, no_color)
    };
    print!("{}", rendered);
    Ok(())
}

pub fn profile(args: ProfileArgs) -> Result<(), Box<dyn Error>> {
    let root = args.path.as_deref().unwrap_or(".");
    let config = config::load_config(Path::new(root));
    let ctx = ScopeContext::open(Path::new(root), &config.exclude.unwrap_or_default())?;
    let outcome = ctx.run(&ScopingDirectives::default())?;

    println!("Project: {}", bundle::project_name(ctx.root()));
    if outcome.profile.is_empty() {
        println!("Stack: unknown");
    } else {
        println!("Stack: {}", text::stack_summary(&outcome.profile));
    }
    let pins = constraints::tech_constraints(ctx.root());
    if !pins.is_empty() {
        println!("Environment constraints:");
        for pin in pins {
            println!("  - {}", pin);
        }
    }
    Ok(())
}

fn run_engine(
    flags: &ScopeFlags,
    config: &Config,
) -> Result<(ScopeContext, ScopingDirectives, ScopeOutcome), Box<dyn Error>> {
    let directives = flags.directives(config);
    directives.validate()?;

    let ctx = ScopeContext::open(Path::new(flags.root()), &directives.extra_exclude_globs)?;
    let outcome = ctx.run(&directives)?;
    Ok((ctx, directives, outcome))
}
