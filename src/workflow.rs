//! パイプラインのメインワークフローを定義するモジュール。
//!
//! 処理は次の順で一直線に進み、どこかで失敗した時点で終了します。再試行はしません。
//!
//! `Validate → CheckDeps → PrepareWorkspace → Extract → Match → Map → VerifyReconstruction → Train → Report`

use crate::config::PipelineConfig;
use crate::domain::image_set::ImageSet;
use crate::domain::workspace::Workspace;
use crate::error::{PipelineError, Result};
use crate::tools::colmap::ReconstructionStep;
use crate::tools::opensplat;
use crate::tools::runner::{render_command, CommandRunner};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 再構成結果として読む番号付きモデル。
const MODEL_INDEX: usize = 0;

/// ワークフローの各段階。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    CheckDependencies,
    PrepareWorkspace,
    Reconstruct(ReconstructionStep),
    VerifyReconstruction,
    Train,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validate => f.write_str("入力の検証"),
            Stage::CheckDependencies => f.write_str("依存ツールの確認"),
            Stage::PrepareWorkspace => f.write_str("作業ディレクトリの準備"),
            Stage::Reconstruct(step) => write!(f, "{}", step),
            Stage::VerifyReconstruction => f.write_str("再構成結果の確認"),
            Stage::Train => f.write_str("Gaussian splatting の学習"),
            Stage::Report => f.write_str("結果の報告"),
        }
    }
}

/// 成功時の最終結果。
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactReport {
    pub path: PathBuf,
    pub size: u64,
    pub workspace: PathBuf,
}

impl fmt::Display for ArtifactReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "出力: {} ({}, {} bytes)",
            self.path.display(),
            format_size(self.size),
            self.size
        )?;
        write!(f, "作業ディレクトリ: {}", self.workspace.display())
    }
}

/// 設定とコマンド実行手段を受け取り、各ステージを実行します。
pub struct Pipeline<'a, R: CommandRunner> {
    config: &'a PipelineConfig,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Pipeline<'a, R> {
    pub fn new(config: &'a PipelineConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// すべてのステージを順に実行します。
    ///
    /// # 戻り値
    /// * `Ok(ArtifactReport)`: 出力ファイルが作成された場合。
    /// * `Err(PipelineError)`: いずれかのステージが失敗した場合。作業ディレクトリは残ります。
    pub fn run(&self) -> Result<ArtifactReport> {
        narrate(Stage::Validate);
        let images = self.validate_inputs()?;

        narrate(Stage::CheckDependencies);
        self.check_dependency(&self.config.colmap)?;
        self.check_dependency(&self.config.opensplat)?;

        narrate(Stage::PrepareWorkspace);
        let workspace = self.prepare_workspace(&images)?;
        info!(workspace = %workspace.dir().display(), "作業ディレクトリを作成しました");

        let result = self.run_in_workspace(&workspace);
        if result.is_err() {
            warn!(
                workspace = %workspace.dir().display(),
                "調査用に作業ディレクトリを残しています"
            );
        }
        result
    }

    fn run_in_workspace(&self, workspace: &Workspace) -> Result<ArtifactReport> {
        self.run_reconstruction(workspace)?;

        narrate(Stage::VerifyReconstruction);
        self.verify_reconstruction(workspace)?;

        narrate(Stage::Train);
        self.run_splatting(workspace)?;

        narrate(Stage::Report);
        self.report(workspace)
    }

    /// 入力ディレクトリを検証し、画像が `MIN_IMAGES` 枚以上あることを確認します。
    pub fn validate_inputs(&self) -> Result<ImageSet> {
        let images = ImageSet::from_directory(&self.config.input_dir)?;
        info!(count = images.len(), dir = %images.dir().display(), "入力画像を確認しました");
        Ok(images)
    }

    /// 外部ツールが実行できる場所にあるか確認します。
    pub fn check_dependency(&self, tool: &str) -> Result<PathBuf> {
        match self.runner.locate(tool) {
            Some(path) => {
                debug!(tool, path = %path.display(), "依存ツールを見つけました");
                Ok(path)
            }
            None => Err(PipelineError::MissingDependency {
                tool: tool.to_string(),
                hint: install_hint(tool, &self.config.colmap),
            }),
        }
    }

    /// 作業ディレクトリを作り、出力パスと衝突しないことを確認します。
    pub fn prepare_workspace(&self, images: &ImageSet) -> Result<Workspace> {
        let workspace = Workspace::prepare(&self.config.workspace_root, images)?;
        self.ensure_output_outside(&workspace)?;
        Ok(workspace)
    }

    /// 出力パスが作業ディレクトリの中を指していないことを確認します。
    pub fn ensure_output_outside(&self, workspace: &Workspace) -> Result<()> {
        if workspace.contains(&self.config.output) {
            return Err(PipelineError::Usage(format!(
                "出力パス '{}' が作業ディレクトリ '{}' の中を指しています。",
                self.config.output.display(),
                workspace.dir().display()
            )));
        }
        Ok(())
    }

    /// COLMAP の3つのサブステップを順に実行します。最初の失敗で中断します。
    pub fn run_reconstruction(&self, workspace: &Workspace) -> Result<()> {
        for step in ReconstructionStep::ALL {
            narrate(Stage::Reconstruct(step));
            let args = step.args(workspace);
            let output = self
                .runner
                .run(&self.config.colmap, &args)
                .map_err(|e| PipelineError::Reconstruction {
                    step,
                    detail: format!(
                        "'{}' を起動できません: {}",
                        render_command(&self.config.colmap, &args),
                        e
                    ),
                })?;
            if !output.is_success() {
                return Err(PipelineError::Reconstruction {
                    step,
                    detail: output.to_string(),
                });
            }
        }
        Ok(())
    }

    /// `sparse/0` が作られたことを確認します。
    pub fn verify_reconstruction(&self, workspace: &Workspace) -> Result<()> {
        if workspace.has_model(MODEL_INDEX) {
            return Ok(());
        }
        Err(PipelineError::Reconstruction {
            step: ReconstructionStep::Mapping,
            detail: format!(
                "モデル '{}' が作成されていません。カメラ姿勢を推定できた画像が少なすぎる可能性があります。",
                workspace.model_dir(MODEL_INDEX).display()
            ),
        })
    }

    /// OpenSplat で学習し、出力ファイルが空でないことを確認します。
    pub fn run_splatting(&self, workspace: &Workspace) -> Result<()> {
        let config = self.config;
        let args = opensplat::training_args(
            workspace,
            &config.output,
            config.cpu_only,
            &config.passthrough,
        );
        let output =
            self.runner
                .run(&config.opensplat, &args)
                .map_err(|e| PipelineError::Training {
                    detail: format!(
                        "'{}' を起動できません: {}",
                        render_command(&config.opensplat, &args),
                        e
                    ),
                })?;
        if !output.is_success() {
            return Err(PipelineError::Training {
                detail: output.to_string(),
            });
        }

        match artifact_size(&config.output) {
            Some(size) if size > 0 => Ok(()),
            _ => Err(PipelineError::Training {
                detail: format!(
                    "学習は正常終了しましたが、'{}' が作成されていないか空です。",
                    config.output.display()
                ),
            }),
        }
    }

    /// 出力ファイルのパスとサイズをまとめます。
    pub fn report(&self, workspace: &Workspace) -> Result<ArtifactReport> {
        let report = ArtifactReport {
            path: self.config.output.clone(),
            size: artifact_size(&self.config.output).unwrap_or(0),
            workspace: workspace.dir().to_path_buf(),
        };
        info!(path = %report.path.display(), size = report.size, "完了しました");
        Ok(report)
    }
}

fn narrate(stage: Stage) {
    info!("[{}]", stage);
}

fn artifact_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

fn install_hint(tool: &str, colmap: &str) -> &'static str {
    if tool == colmap {
        "COLMAP をインストールして PATH に追加するか、--colmap で実行ファイルを指定してください。"
    } else {
        "OpenSplat をビルドして PATH に追加するか、--opensplat で実行ファイルを指定してください。"
    }
}

/// バイト数を読みやすい単位に変換します。
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
