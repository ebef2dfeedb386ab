use crate::tools::{colmap, opensplat};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// 写真のディレクトリから COLMAP と OpenSplat を順に実行して 3D Gaussian splat (.ply) を作るツール
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 作業ディレクトリを作成する場所 (オプション: デフォルトはシステムの一時ディレクトリ)
    #[arg(long, value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// COLMAP の実行ファイル
    #[arg(long, value_name = "PROGRAM", default_value = colmap::DEFAULT_PROGRAM)]
    pub colmap: String,

    /// OpenSplat の実行ファイル
    #[arg(long, value_name = "PROGRAM", default_value = opensplat::DEFAULT_PROGRAM)]
    pub opensplat: String,

    /// 学習を CPU モードに固定しない (GPU 版の OpenSplat 向け)
    #[arg(long)]
    pub gpu: bool,

    /// ログを詳しくする (-vv でさらに詳しく)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// 警告とエラーだけを表示する
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// 入力画像 (jpg/jpeg/png/tif/tiff) が入ったディレクトリ
    #[arg(required = true)]
    pub input_dir: PathBuf,

    /// 出力パス (省略時は splat.ply) と、それに続く OpenSplat へのオプション。
    /// 先頭のオプションがこのツールのものと重なる場合は `--` の後ろに書く
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "ARGS"
    )]
    pub rest: Vec<String>,
}

impl Args {
    /// ログのフィルタ指定 (`RUST_LOG` が無いときに使う)。
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
