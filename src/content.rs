use crate::scope::{FileRole, RenderMode, ScopedFile};
use crate::skeleton;
use crate::tokens;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Files larger than this are listed as skipped rather than rendered.
pub const MAX_TEXT_BYTES: u64 = 200_000;

const HASH_PREFIX_LEN: usize = 12;
const SNIFF_BYTES: usize = 8192;
const SOURCE_EXTENSIONS: &[&str] = &["vue", "svelte", "scss", "sass", "less", "prisma", "sql"];

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub tokens: bool,
    /// Worker threads; 0 picks the CPU count.
    pub jobs: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderedFile {
    pub path: String,
    pub role: FileRole,
    pub mode: RenderMode,
    pub lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedContent {
    pub files: Vec<RenderedFile>,
    pub skipped: Vec<SkippedFile>,
    /// Target or dependency files that are listed but could not be rendered.
    pub warnings: Vec<String>,
}

enum Loaded {
    Rendered(RenderedFile),
    /// Listed without content, with the reason surfaced as a warning.
    Unrendered(RenderedFile, String),
    Skipped(SkippedFile),
}

/// Reads and renders every scoped file in order. Excluded files are listed
/// without being opened.
pub fn load(files: &[ScopedFile], options: LoadOptions) -> LoadedContent {
    let jobs = if options.jobs == 0 {
        num_cpus::get()
    } else {
        options.jobs
    };

    let loaded: Vec<Loaded> = if jobs > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| files.par_iter().map(|f| load_one(f, options)).collect()),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable; loading sequentially");
                files.iter().map(|f| load_one(f, options)).collect()
            }
        }
    } else {
        files.iter().map(|f| load_one(f, options)).collect()
    };

    let mut content = LoadedContent::default();
    for item in loaded {
        match item {
            Loaded::Rendered(file) => content.files.push(file),
            Loaded::Unrendered(file, warning) => {
                content.files.push(file);
                content.warnings.push(warning);
            }
            Loaded::Skipped(file) => content.skipped.push(file),
        }
    }
    content
}

/// Target and dependencies are what the request is about, so they bypass the
/// size cap and the extension check; only real binary content stops them.
fn load_one(file: &ScopedFile, options: LoadOptions) -> Loaded {
    let path = file.path().to_string();
    let listed = |path: String| RenderedFile {
        path,
        role: file.role,
        mode: file.render_mode,
        lines: 0,
        hash: None,
        tokens: None,
        content: None,
    };
    if file.render_mode == RenderMode::Excluded {
        return Loaded::Rendered(listed(path));
    }

    let required = file.role.is_required();
    let full_path = &file.candidate.absolute_path;
    if !required && !is_text_file(full_path) {
        debug!(%path, "skipping binary or oversized file");
        return Loaded::Skipped(SkippedFile {
            path,
            reason: "binary or larger than 200 kB".to_string(),
        });
    }
    let bytes = match fs::read(full_path) {
        Ok(bytes) => bytes,
        Err(e) if required => {
            warn!(%path, error = %e, "cannot read {} file", file.role.as_str());
            let warning = format!("{} {} could not be read: {}", file.role.as_str(), path, e);
            return Loaded::Unrendered(listed(path), warning);
        }
        Err(e) => {
            warn!(%path, error = %e, "cannot read file");
            return Loaded::Skipped(SkippedFile {
                path,
                reason: format!("unreadable: {}", e),
            });
        }
    };
    if looks_binary(&bytes) && required {
        warn!(%path, "{} file is binary; listing without content", file.role.as_str());
        let warning = format!("{} {} is a binary file; its content is not shown", file.role.as_str(), path);
        return Loaded::Unrendered(listed(path), warning);
    }
    if looks_binary(&bytes) {
        return Loaded::Skipped(SkippedFile {
            path,
            reason: "binary or larger than 200 kB".to_string(),
        });
    }

    let text = String::from_utf8_lossy(&bytes);
    let rendered = match file.render_mode {
        RenderMode::Skeleton => skeleton::to_skeleton(&text, file.candidate.extension.as_deref()),
        _ => text.into_owned(),
    };
    let tokens = options
        .tokens
        .then(|| tokens::count_tokens(&rendered, tokens::DEFAULT_ENCODING));

    Loaded::Rendered(RenderedFile {
        path,
        role: file.role,
        mode: file.render_mode,
        lines: rendered.lines().count(),
        hash: Some(content_hash(rendered.as_bytes())),
        tokens,
        content: Some(rendered),
    })
}

/// Hex SHA-256 prefix of the rendered bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hex = format!("{:x}", hasher.finalize());
    hex[..HASH_PREFIX_LEN].to_string()
}

fn is_text_file(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    // mime_guess maps `.ts` to MPEG transport streams.
    let known_source = extension
        .as_deref()
        .map(|e| skeleton::supports(e) || SOURCE_EXTENSIONS.contains(&e))
        .unwrap_or(false);

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    use mime_guess::mime;

    let likely_binary = !known_source && match mime.type_() {
        mime::IMAGE | mime::VIDEO | mime::AUDIO => mime.subtype() != mime::SVG,
        mime::APPLICATION => {
            mime.subtype() == mime::OCTET_STREAM || mime.subtype() == mime::PDF
        }
        _ => false,
    };
    if likely_binary && extension.is_some() {
        return false;
    }

    match fs::metadata(path) {
        Ok(metadata) => metadata.len() <= MAX_TEXT_BYTES,
        Err(_) => false,
    }
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(SNIFF_BYTES).any(|&b| b == 0)
}
