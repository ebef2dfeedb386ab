//! COLMAP（SfM 再構成ツール）の呼び出し方。

use crate::domain::workspace::Workspace;
use std::ffi::OsString;
use std::fmt;

pub const DEFAULT_PROGRAM: &str = "colmap";

/// 再構成の3つのサブステップ。この順で実行します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionStep {
    FeatureExtraction,
    ExhaustiveMatching,
    Mapping,
}

impl ReconstructionStep {
    pub const ALL: [ReconstructionStep; 3] = [
        ReconstructionStep::FeatureExtraction,
        ReconstructionStep::ExhaustiveMatching,
        ReconstructionStep::Mapping,
    ];

    pub fn subcommand(self) -> &'static str {
        match self {
            ReconstructionStep::FeatureExtraction => "feature_extractor",
            ReconstructionStep::ExhaustiveMatching => "exhaustive_matcher",
            ReconstructionStep::Mapping => "mapper",
        }
    }

    /// サブコマンドを含む COLMAP への引数。
    pub fn args(self, workspace: &Workspace) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.subcommand().into(),
            "--database_path".into(),
            workspace.database_path().into(),
        ];
        match self {
            ReconstructionStep::FeatureExtraction => {
                args.push("--image_path".into());
                args.push(workspace.images_dir().into());
                // 全画像を同一カメラで撮影したとみなす
                args.push("--ImageReader.single_camera".into());
                args.push("1".into());
            }
            ReconstructionStep::ExhaustiveMatching => {}
            ReconstructionStep::Mapping => {
                args.push("--image_path".into());
                args.push(workspace.images_dir().into());
                args.push("--output_path".into());
                args.push(workspace.sparse_dir().into());
            }
        }
        args
    }
}

impl fmt::Display for ReconstructionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReconstructionStep::FeatureExtraction => "特徴量抽出",
            ReconstructionStep::ExhaustiveMatching => "全ペアマッチング",
            ReconstructionStep::Mapping => "インクリメンタルマッピング",
        };
        f.write_str(label)
    }
}
