use std::ffi::OsString;
use std::fmt;
use std::io::Write as _;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use indexmap::IndexMap;
use log::{debug, info, trace};
use tempfile::{Builder, NamedTempFile};

use crate::error::{ErdError, RenderError};
use crate::uid::IdGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Sfdp,
    Neato,
}

impl Engine {
    pub fn name(self) -> &'static str {
        match self {
            Engine::Sfdp => "sfdp",
            Engine::Neato => "neato",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Text(String),
    Html(String),
}

impl Label {
    fn to_dot(&self) -> String {
        match self {
            Label::Text(text) => quote(text),
            Label::Html(markup) => format!("<{markup}>"),
        }
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Label::Text(text.to_string())
    }
}

impl From<String> for Label {
    fn from(text: String) -> Self {
        Label::Text(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style(IndexMap<String, String>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: &Style) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    fn to_dot(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}={}", quote(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone)]
struct NodeStmt {
    label: Label,
    style: Style,
}

#[derive(Debug, Clone)]
struct EdgeStmt {
    from: String,
    to: String,
    style: Style,
}

#[derive(Debug)]
pub struct DotGraph<'a> {
    name: String,
    engine: Engine,
    program: PathBuf,
    graph_attrs: Style,
    ids: &'a IdGenerator,
    default_node_style: Style,
    node_styles: Vec<Style>,
    nodes: IndexMap<String, NodeStmt>,
    edges: Vec<EdgeStmt>,
}

impl<'a> DotGraph<'a> {
    pub fn new(
        name: impl Into<String>,
        engine: Engine,
        graph_attrs: Style,
        ids: &'a IdGenerator,
    ) -> Self {
        let mut attrs = Style::new().with("layout", engine.name());
        attrs.merge(&graph_attrs);
        Self {
            name: name.into(),
            engine,
            program: PathBuf::from(engine.name()),
            graph_attrs: attrs,
            ids,
            default_node_style: Style::new(),
            node_styles: Vec::new(),
            nodes: IndexMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn create_node(&mut self, label: impl Into<Label>, overrides: Style) -> String {
        let id = self.ids.next(None);
        let mut style = self.current_node_style();
        style.merge(&overrides);
        let label = label.into();
        trace!(id = id.as_str(), label:? = label; "node");
        self.nodes.insert(id.clone(), NodeStmt { label, style });
        id
    }

    pub fn create_edge(
        &mut self,
        from: &str,
        to: &str,
        label: Option<&str>,
        overrides: Style,
    ) -> Result<(), RenderError> {
        for id in [from, to] {
            if !self.nodes.contains_key(id) {
                return Err(RenderError::UnknownNode { id: id.to_string() });
            }
        }
        let mut style = Style::new();
        if let Some(label) = label {
            style.set("label", label);
        }
        style.merge(&overrides);
        trace!(from = from, to = to; "edge");
        self.edges.push(EdgeStmt {
            from: from.to_string(),
            to: to.to_string(),
            style,
        });
        Ok(())
    }

    pub fn set_default_node_style(&mut self, style: Style) {
        self.default_node_style = style;
    }

    pub fn node_style(&mut self, style: Style) -> NodeStyleScope<'_, 'a> {
        self.node_styles.push(style);
        NodeStyleScope { graph: self }
    }

    fn current_node_style(&self) -> Style {
        let mut style = self.default_node_style.clone();
        for layer in &self.node_styles {
            style.merge(layer);
        }
        style
    }

    pub fn source(&self) -> String {
        let mut out = format!("graph {} {{\n", quote(&self.name));
        if !self.graph_attrs.is_empty() {
            out.push_str(&format!("\tgraph [{}]\n", self.graph_attrs.to_dot()));
        }
        for (id, node) in &self.nodes {
            let mut attrs = format!("label={}", node.label.to_dot());
            if !node.style.is_empty() {
                attrs.push(' ');
                attrs.push_str(&node.style.to_dot());
            }
            out.push_str(&format!("\t{} [{attrs}]\n", quote(id)));
        }
        for edge in &self.edges {
            out.push_str(&format!("\t{} -- {}", quote(&edge.from), quote(&edge.to)));
            if !edge.style.is_empty() {
                out.push_str(&format!(" [{}]", edge.style.to_dot()));
            }
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    pub fn save(&self, destination: impl AsRef<Path>) -> Result<(), ErdError> {
        let destination = destination.as_ref();
        let source = self.write_source_temp(destination)?;
        source.persist(destination).map_err(|err| err.error)?;
        info!(path:? = destination; "graph description saved");
        Ok(())
    }

    /// Writes the DOT description to `destination` and has the engine
    /// render it to `destination.<format>`, which is returned.
    pub fn export(&self, destination: impl AsRef<Path>, format: &str) -> Result<PathBuf, ErdError> {
        let destination = destination.as_ref();
        let artifact = artifact_path(destination, format);

        let source = self.write_source_temp(destination)?;
        let staged = Builder::new()
            .prefix(".erd-")
            .suffix(&format!(".{format}"))
            .tempfile_in(staging_dir(destination))?;

        debug!(
            engine = self.engine.name(),
            program:? = self.program,
            format = format;
            "running layout engine"
        );
        let output = Command::new(&self.program)
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(staged.path())
            .arg(source.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ErdError::EngineLaunch {
                engine: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ErdError::Engine {
                engine: self.program.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        staged.persist(&artifact).map_err(|err| err.error)?;
        source.persist(destination).map_err(|err| err.error)?;
        info!(artifact:? = artifact; "diagram exported");
        Ok(artifact)
    }

    pub fn view(&self, destination: impl AsRef<Path>, format: &str) -> Result<PathBuf, ErdError> {
        let artifact = self.export(destination, format)?;
        let mut child = opener().arg(&artifact).spawn()?;
        thread::spawn(move || child.wait());
        Ok(artifact)
    }

    fn write_source_temp(&self, destination: &Path) -> Result<NamedTempFile, ErdError> {
        let mut file = Builder::new()
            .prefix(".erd-")
            .suffix(".gv")
            .tempfile_in(staging_dir(destination))?;
        file.write_all(self.source().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

#[derive(Debug)]
pub struct NodeStyleScope<'g, 'a> {
    graph: &'g mut DotGraph<'a>,
}

impl<'a> Deref for NodeStyleScope<'_, 'a> {
    type Target = DotGraph<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.graph
    }
}

impl DerefMut for NodeStyleScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.graph
    }
}

impl Drop for NodeStyleScope<'_, '_> {
    fn drop(&mut self) {
        self.graph.node_styles.pop();
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Graphviz convention: `diagram.gv` renders to `diagram.gv.pdf`.
fn artifact_path(destination: &Path, format: &str) -> PathBuf {
    let mut path = OsString::from(destination.as_os_str());
    path.push(".");
    path.push(format);
    PathBuf::from(path)
}

fn staging_dir(destination: &Path) -> &Path {
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn opener() -> Command {
    if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    }
}
