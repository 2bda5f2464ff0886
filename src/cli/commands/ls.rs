//! ls command - Print the tree under a group

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::types::{Location, PathRequirement};
use crate::store::handle::{OpenMode, StoreHandle};
use crate::store::node::{Group, Node};

/// Print the tree under `location`.
pub fn ls(ctx: &Context, location: &str) -> Result<()> {
    let target = Location::parse(location, PathRequirement::Optional)?;
    let handle = StoreHandle::acquire(&target.file, OpenMode::Read, ctx.policy)
        .with_context(|| format!("Failed to open {}", target.file.display()))?;

    let lines = if target.group.is_root() {
        let mut lines = vec!["/".to_string()];
        render_group(handle.root(), 1, &mut lines);
        lines
    } else {
        match handle.node(&target.group) {
            Some(node) => render(&target.group.to_string(), node),
            None => bail!("Nothing at {}", target),
        }
    };
    handle.close()?;

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Lines for `node` shown under `label`: groups end in `/`, datasets show
/// their kind and shape or value. Children are indented two spaces per level.
pub fn render(label: &str, node: &Node) -> Vec<String> {
    let mut lines = Vec::new();
    push_node(label, node, 0, &mut lines);
    lines
}

fn push_node(label: &str, node: &Node, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Group(group) => {
            lines.push(format!("{}{}/", indent, label));
            render_group(group, depth + 1, lines);
        }
        Node::Dataset(data) => lines.push(format!("{}{}  {}", indent, label, data.describe())),
    }
}

fn render_group(group: &Group, depth: usize, lines: &mut Vec<String>) {
    for (name, child) in group.children() {
        push_node(name.as_str(), child, depth, lines);
    }
}
