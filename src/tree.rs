use crate::scope::{FileRole, RenderMode, ScopedFile};
use colored::*;
use std::collections::BTreeMap;

pub fn render_flat(files: &[ScopedFile], no_color: bool) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str(&format!(
            "{} {}{}\n",
            role_marker(file.role, no_color),
            file.path(),
            mode_suffix(file.render_mode, no_color)
        ));
    }
    out
}

pub fn render_tree(files: &[ScopedFile], no_color: bool) -> String {
    let tree = build_tree(files);
    let mut out = String::new();
    render_node(&tree, "", true, no_color, &mut out);
    out
}

struct TreeNode {
    name: String,
    file: Option<(FileRole, RenderMode)>,
    children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn new(name: String) -> Self {
        TreeNode {
            name,
            file: None,
            children: BTreeMap::new(),
        }
    }

    /// Highest-priority role anywhere below this node.
    fn best_role(&self) -> FileRole {
        let own = self.file.map(|(role, _)| role).unwrap_or(FileRole::Normal);
        self.children
            .values()
            .map(TreeNode::best_role)
            .fold(own, |best, role| best.min(role))
    }
}

fn build_tree(files: &[ScopedFile]) -> TreeNode {
    let mut root = TreeNode::new(".".to_string());

    for file in files {
        let parts: Vec<&str> = file.path().split('/').collect();
        let mut current = &mut root;

        for (i, part) in parts.iter().enumerate() {
            current = current
                .children
                .entry(part.to_string())
                .or_insert_with(|| TreeNode::new(part.to_string()));

            if i == parts.len() - 1 {
                current.file = Some((file.role, file.render_mode));
            }
        }
    }

    root
}

fn render_node(node: &TreeNode, prefix: &str, is_last: bool, no_color: bool, out: &mut String) {
    if node.name != "." {
        let connector = if is_last { "└── " } else { "├── " };

        let display_name = match node.file {
            Some((role, mode)) if node.children.is_empty() => format!(
                "{} {}{}",
                role_marker(role, no_color),
                node.name,
                mode_suffix(mode, no_color)
            ),
            _ if no_color => format!("{}/", node.name),
            _ => format!("{}", node.name.blue().bold()),
        };

        out.push_str(&format!("{}{}{}\n", prefix, connector, display_name));
    }

    let mut sorted_children: Vec<&TreeNode> = node.children.values().collect();
    sorted_children.sort_by(|a, b| a.best_role().cmp(&b.best_role()).then(a.name.cmp(&b.name)));

    for (i, child) in sorted_children.iter().enumerate() {
        let is_last_child = i == sorted_children.len() - 1;
        let new_prefix = if node.name == "." {
            String::new()
        } else {
            format!("{}{}   ", prefix, if is_last { " " } else { "│" })
        };
        render_node(child, &new_prefix, is_last_child, no_color, out);
    }
}

fn role_marker(role: FileRole, no_color: bool) -> String {
    let label = format!("[{}]", role.as_str());
    let label = format!("{:<12}", label);
    if no_color {
        return label;
    }
    match role {
        FileRole::Target => label.green().bold().to_string(),
        FileRole::Dependency => label.cyan().to_string(),
        FileRole::Changed => label.yellow().to_string(),
        FileRole::Config => label.magenta().to_string(),
        FileRole::Normal => label.dimmed().to_string(),
    }
}

fn mode_suffix(mode: RenderMode, no_color: bool) -> String {
    let suffix = match mode {
        RenderMode::Full => return String::new(),
        RenderMode::Skeleton => " (skeleton)",
        RenderMode::Excluded => " (excluded)",
    };
    if no_color {
        suffix.to_string()
    } else if mode == RenderMode::Excluded {
        suffix.red().to_string()
    } else {
        suffix.dimmed().to_string()
    }
}
