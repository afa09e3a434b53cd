//! Config Node Library
//!
//! Hierarchical document format used for scenario persistence:
//!
//! ```text
//! HideGroundStations = False
//! Constellations
//! {
//!     Constellation
//!     {
//!         id = 1
//!         name = Relay Net
//!     }
//! }
//! ```
//!
//! A document is a tree of [`CfgNode`]s. Each node holds ordered `key = value`
//! pairs and ordered child nodes; names may repeat at both levels.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CfgError {
    #[error("Line {line}: '}}' without a matching '{{'")]
    UnexpectedClose { line: usize },
    #[error("Line {line}: '{{' without a section name")]
    MissingName { line: usize },
    #[error("Line {line}: section name '{name}' is not followed by '{{'")]
    DanglingName { name: String, line: usize },
    #[error("Section '{0}' is never closed")]
    Unclosed(String),
    #[error("Line {line}: empty key")]
    EmptyKey { line: usize },
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, CfgError>;

/// Name given to the implicit top-level node produced by [`CfgNode::parse`].
pub const ROOT_NAME: &str = "root";

const INDENT: &str = "\t";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgNode {
    name: String,
    values: Vec<CfgValue>,
    nodes: Vec<CfgNode>,
}

impl CfgNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[CfgValue] {
        &self.values
    }

    pub fn nodes(&self) -> &[CfgNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.nodes.is_empty()
    }

    /// Append a value, keeping any existing value of the same name.
    pub fn add_value(&mut self, name: impl Into<String>, value: impl ToString) {
        self.values.push(CfgValue {
            name: name.into(),
            value: value.to_string(),
        });
    }

    /// Replace every value named `name` with a single new value.
    pub fn set_value(&mut self, name: &str, value: impl ToString) {
        self.remove_value(name);
        self.add_value(name, value);
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set_value(name, if value { "True" } else { "False" });
    }

    pub fn remove_value(&mut self, name: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|v| v.name != name);
        before - self.values.len()
    }

    /// First value named `name`.
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    /// All values named `name`, in document order.
    pub fn get_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .iter()
            .filter(move |v| v.name == name)
            .map(|v| v.value.as_str())
    }

    pub fn get_parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.get_value(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| CfgError::InvalidValue {
                    key: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    /// Booleans are accepted case-insensitively (`True`, `false`, ...).
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.get_value(name) {
            None => Ok(None),
            Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(raw) => Err(CfgError::InvalidValue {
                key: name.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    pub fn get_node(&self, name: &str) -> Option<&CfgNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn get_node_mut(&mut self, name: &str) -> Option<&mut CfgNode> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    pub fn get_nodes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CfgNode> + 'a {
        self.nodes.iter().filter(move |n| n.name == name)
    }

    pub fn add_node(&mut self, node: CfgNode) -> &mut CfgNode {
        self.nodes.push(node);
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    /// Remove every child section named `name`. Returns how many were removed.
    pub fn remove_node(&mut self, name: &str) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.name != name);
        before - self.nodes.len()
    }

    /// Parse a document. The returned node is named [`ROOT_NAME`] and holds
    /// the top-level values and sections.
    pub fn parse(text: &str) -> Result<CfgNode> {
        let mut stack: Vec<CfgNode> = vec![CfgNode::new(ROOT_NAME)];
        let mut pending: Option<(String, usize)> = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            if line == "{" {
                let (name, _) = pending
                    .take()
                    .ok_or(CfgError::MissingName { line: line_no })?;
                stack.push(CfgNode::new(name));
                continue;
            }

            if let Some((name, line)) = pending.take() {
                return Err(CfgError::DanglingName { name, line });
            }

            if line == "}" {
                close_section(&mut stack, line_no)?;
                continue;
            }

            if let Some(name) = line.strip_suffix('{') {
                let name = name.trim();
                if name.is_empty() {
                    return Err(CfgError::MissingName { line: line_no });
                }
                stack.push(CfgNode::new(name));
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(CfgError::EmptyKey { line: line_no });
                }
                let current = stack.last_mut().ok_or(CfgError::UnexpectedClose { line: line_no })?;
                current.add_value(key, value.trim());
                continue;
            }

            pending = Some((line.to_string(), line_no));
        }

        if let Some((name, line)) = pending {
            return Err(CfgError::DanglingName { name, line });
        }
        if stack.len() > 1 {
            let open = stack.pop().map(|n| n.name).unwrap_or_default();
            return Err(CfgError::Unclosed(open));
        }

        let root = stack.pop().unwrap_or_else(|| CfgNode::new(ROOT_NAME));
        trace!(
            values = root.values.len(),
            sections = root.nodes.len(),
            "Parsed config document"
        );
        Ok(root)
    }

    /// Render this node's contents without the surrounding section header,
    /// which is the inverse of [`CfgNode::parse`].
    pub fn to_document(&self) -> String {
        let mut out = String::new();
        self.write_contents(&mut out, 0);
        out
    }

    fn write_contents(&self, out: &mut String, depth: usize) {
        let pad = INDENT.repeat(depth);
        for v in &self.values {
            out.push_str(&pad);
            out.push_str(&v.name);
            out.push_str(" = ");
            out.push_str(&v.value);
            out.push('\n');
        }
        for node in &self.nodes {
            node.write_section(out, depth);
        }
    }

    fn write_section(&self, out: &mut String, depth: usize) {
        let pad = INDENT.repeat(depth);
        out.push_str(&pad);
        out.push_str(&self.name);
        out.push('\n');
        out.push_str(&pad);
        out.push_str("{\n");
        self.write_contents(out, depth + 1);
        out.push_str(&pad);
        out.push_str("}\n");
    }
}

impl fmt::Display for CfgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_section(&mut out, 0);
        f.write_str(&out)
    }
}

impl FromStr for CfgNode {
    type Err = CfgError;

    fn from_str(s: &str) -> Result<Self> {
        CfgNode::parse(s)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn close_section(stack: &mut Vec<CfgNode>, line: usize) -> Result<()> {
    if stack.len() < 2 {
        return Err(CfgError::UnexpectedClose { line });
    }
    let finished = stack.pop().ok_or(CfgError::UnexpectedClose { line })?;
    let parent = stack.last_mut().ok_or(CfgError::UnexpectedClose { line })?;
    parent.nodes.push(finished);
    Ok(())
}
