//! 1回の実行に必要な設定をまとめたコンテキスト。
//!
//! 各ステージはカレントディレクトリなどの暗黙の状態に頼らず、ここから値を受け取ります。

use crate::cli::Args;
use crate::error::PipelineError;
use crate::tools::{colmap, opensplat};
use std::path::PathBuf;

pub const DEFAULT_OUTPUT: &str = "splat.ply";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    /// OpenSplat にそのまま渡すオプション (順序を保持)。
    pub passthrough: Vec<String>,
    pub workspace_root: PathBuf,
    pub colmap: String,
    pub opensplat: String,
    /// 学習に `--cpu` を付けるか。
    pub cpu_only: bool,
}

impl PipelineConfig {
    /// 既定値で設定を作ります。出力は `splat.ply`、作業ディレクトリはシステムの一時ディレクトリ。
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            passthrough: Vec::new(),
            workspace_root: std::env::temp_dir(),
            colmap: colmap::DEFAULT_PROGRAM.to_string(),
            opensplat: opensplat::DEFAULT_PROGRAM.to_string(),
            cpu_only: true,
        }
    }
}

/// 入力ディレクトリの後ろの引数を、出力パスとパススルーオプションに分けます。
///
/// 先頭が `-` で始まらなければ出力パス、そうでなければ全体をオプションとみなします。
/// 出力パスの直後の `--` は区切りとして1つだけ取り除きます。
pub fn split_output(rest: Vec<String>) -> (Option<PathBuf>, Vec<String>) {
    let mut rest = rest.into_iter().peekable();
    match rest.next() {
        Some(first) if !first.starts_with('-') => {
            rest.next_if(|arg| arg == "--");
            (Some(PathBuf::from(first)), rest.collect())
        }
        Some(first) => (None, std::iter::once(first).chain(rest).collect()),
        None => (None, Vec::new()),
    }
}

impl TryFrom<Args> for PipelineConfig {
    type Error = PipelineError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let (output, passthrough) = split_output(args.rest);
        if output.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(PipelineError::Usage(
                "出力パスが空です。省略すると splat.ply になります。".to_string(),
            ));
        }

        let mut config = PipelineConfig::new(args.input_dir);
        if let Some(output) = output {
            config.output = output;
        }
        if let Some(root) = args.workspace_root {
            config.workspace_root = root;
        }
        config.passthrough = passthrough;
        config.colmap = args.colmap;
        config.opensplat = args.opensplat;
        config.cpu_only = !args.gpu;
        Ok(config)
    }
}
