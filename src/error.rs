use crate::domain::image_set::ImageSetError;
use crate::domain::workspace::WorkspaceError;
use crate::tools::colmap::ReconstructionStep;
use thiserror::Error;

/// パイプライン全体のエラー。どれも致命的で、回復や再試行はしません。
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("引数が正しくありません: {0}")]
    Usage(String),

    #[error("'{tool}' が見つかりません。{hint}")]
    MissingDependency { tool: String, hint: &'static str },

    #[error("入力画像が不正です: {0}")]
    InvalidInput(#[from] ImageSetError),

    #[error("作業ディレクトリの準備に失敗しました: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("再構成（{step}）に失敗しました。画像の重なりが十分か確認してください。\n{detail}")]
    Reconstruction {
        step: ReconstructionStep,
        detail: String,
    },

    #[error("Gaussian splatting の学習に失敗しました。\n{detail}")]
    Training { detail: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
