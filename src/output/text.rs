use crate::bundle::ContextBundle;
use crate::content::RenderedFile;
use crate::profile::StyleProfile;
use crate::scope::RenderMode;

const RULE_WIDTH: usize = 80;

pub fn render(bundle: &ContextBundle) -> String {
    let mut out = String::new();
    let mut line = |text: &str| {
        out.push_str(text);
        out.push('\n');
    };

    line(&format!("# Project: {}", bundle.project));
    if let Some(request) = &bundle.request {
        line(&format!("# Request: {}", request));
    }
    if let Some(profile) = &bundle.profile {
        line(&format!("# Stack: {}", stack_summary(profile)));
    }
    if !bundle.constraints.tech.is_empty() {
        line("# Environment constraints:");
        for c in &bundle.constraints.tech {
            line(&format!("#   - {}", c));
        }
    }
    if !bundle.constraints.negative.is_empty() {
        line("# Constraints:");
        for c in &bundle.constraints.negative {
            line(&format!("#   - {}", c));
        }
    }
    if !bundle.activity.is_empty() {
        line("# Recent activity:");
        for path in &bundle.activity {
            line(&format!("#   - {}", path));
        }
    }
    for warning in &bundle.warnings {
        line(&format!("# Warning: {}", warning));
    }
    line(&format!("# Files: {} shown", bundle.files_shown));
    for skipped in &bundle.skipped {
        line(&format!("# Skipped: {} ({})", skipped.path, skipped.reason));
    }

    for file in &bundle.files {
        line("");
        line(&"=".repeat(RULE_WIDTH));
        line(&file_header(file));
        line(&"=".repeat(RULE_WIDTH));
        match (&file.content, file.mode) {
            (Some(content), _) => line(content.trim_end_matches('\n')),
            (None, RenderMode::Excluded) => {
                line("[withheld: matches sensitive-file patterns]")
            }
            (None, _) => line("[not shown: binary or unreadable]"),
        }
    }

    if !bundle.files.is_empty() {
        line("");
        line(&format!("# Total lines: {}", bundle.total_lines));
    }
    out
}

fn file_header(file: &RenderedFile) -> String {
    let mut header = format!(
        "FILE: {}\nROLE: {}\nMODE: {}\nLINES: {}",
        file.path,
        file.role.as_str(),
        file.mode.as_str(),
        file.lines
    );
    if let Some(tokens) = file.tokens {
        header.push_str(&format!("\nTOKENS: {}", tokens));
    }
    if let Some(hash) = &file.hash {
        header.push_str(&format!("\nHASH: {}", hash));
    }
    header
}

pub fn stack_summary(profile: &StyleProfile) -> String {
    let mut parts = Vec::new();
    let fields = [
        ("Language", &profile.language),
        ("Framework", &profile.framework),
        ("Styling", &profile.styling),
        ("Validation", &profile.validation),
        ("Testing", &profile.testing),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            parts.push(format!("{}: {}", label, value));
        }
    }
    if !profile.patterns.is_empty() {
        let patterns: Vec<&str> = profile.patterns.iter().map(|p| p.as_str()).collect();
        parts.push(format!("Patterns: {}", patterns.join(", ")));
    }
    parts.join(" | ")
}
