//! Tests for GraphRenderer
//!
//! The `dot` binary is replaced by a recording command runner, files go to
//! temporary directories.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use guesstree::config::GraphConfig;
use guesstree::domain::{parse, DecisionTree, Order};
use guesstree::infrastructure::graph::GraphRenderer;
use guesstree::infrastructure::traits::{CommandRunner, RealFileSystem};
use guesstree::infrastructure::InfraError;

const ANIMALS: &str = "{ is_it_alive? { is_it_a_plant? { tree } { flower } } { cat } }";

struct RecordingRunner {
    status: i32,
    stderr: &'static str,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingRunner {
    fn new(status: i32, stderr: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            stderr,
            calls: Mutex::new(Vec::new()),
        })
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        self.calls.lock().unwrap().push((
            cmd.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        Ok(Output {
            status: ExitStatus::from_raw(self.status << 8),
            stdout: Vec::new(),
            stderr: self.stderr.as_bytes().to_vec(),
        })
    }
}

struct MissingBinary;

impl CommandRunner for MissingBinary {
    fn run(&self, _cmd: &str, _args: &[&str]) -> io::Result<Output> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

fn config_in(temp: &TempDir) -> GraphConfig {
    GraphConfig {
        dot_file: temp.path().join("out/graph.dot"),
        image_file: temp.path().join("out/graph.png"),
        html_file: temp.path().join("out/logs.html"),
        format: "png".into(),
        ..GraphConfig::default()
    }
}

fn animals() -> DecisionTree {
    parse(ANIMALS).unwrap().tree
}

#[test]
fn given_tree_when_rendering_then_writes_dot_and_runs_graphviz() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);
    let runner = RecordingRunner::new(0, "");
    let renderer = GraphRenderer::new(Arc::new(RealFileSystem), runner.clone(), config.clone());

    renderer.render(&animals()).unwrap();

    let dot = std::fs::read_to_string(&config.dot_file).unwrap();
    assert!(dot.starts_with("digraph TREE {"));
    assert_eq!(dot.matches("label=\"YES\"").count(), 2);
    assert_eq!(dot.matches("label=\"NO\"").count(), 2);

    let calls = runner.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (cmd, args) = &calls[0];
    assert_eq!(cmd, "dot");
    assert_eq!(
        args,
        &[
            config.dot_file.display().to_string(),
            "-T".to_string(),
            "png".to_string(),
            "-o".to_string(),
            config.image_file.display().to_string(),
        ]
    );
}

#[test]
fn given_graphviz_fails_when_rendering_then_render_error_and_tree_intact() {
    let temp = TempDir::new().unwrap();
    let runner = RecordingRunner::new(1, "syntax error in line 3\n");
    let renderer = GraphRenderer::new(Arc::new(RealFileSystem), runner, config_in(&temp));
    let tree = animals();

    let err = renderer.render(&tree).unwrap_err();

    match err {
        InfraError::Render { message, exit_code } => {
            assert_eq!(message, "syntax error in line 3");
            assert_eq!(exit_code, Some(1));
        }
        other => panic!("expected render error, got {other:?}"),
    }
    let pre: Vec<_> = tree.values(Order::Pre).collect();
    assert_eq!(pre, ["is_it_alive?", "is_it_a_plant?", "tree", "flower", "cat"]);
}

#[test]
fn given_missing_graphviz_when_rendering_then_render_error() {
    let temp = TempDir::new().unwrap();
    let renderer = GraphRenderer::new(Arc::new(RealFileSystem), Arc::new(MissingBinary), config_in(&temp));

    let err = renderer.render(&animals()).unwrap_err();

    assert!(matches!(err, InfraError::Render { exit_code: None, .. }));
}

#[test]
fn given_dump_when_rendering_then_html_embeds_image() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);
    let renderer = GraphRenderer::new(
        Arc::new(RealFileSystem),
        RecordingRunner::new(0, ""),
        config.clone(),
    );

    renderer.dump(&animals()).unwrap();

    let html = std::fs::read_to_string(&config.html_file).unwrap();
    assert!(html.contains(&format!("<img src=\"{}\" />", config.image_file.display())));
}
