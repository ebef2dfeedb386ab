//! OpenSplat（Gaussian splatting 学習ツール）の呼び出し方。

use crate::domain::workspace::Workspace;
use std::ffi::OsString;
use std::path::Path;

pub const DEFAULT_PROGRAM: &str = "opensplat";
pub const CPU_FLAG: &str = "--cpu";

/// OpenSplat への引数を組み立てます。
///
/// 固定フラグの後ろに `passthrough` をそのままの順序で付けます。
/// `cpu_only` でも、利用者が既に `--cpu` を渡している場合は重複させません。
pub fn training_args(
    workspace: &Workspace,
    output: &Path,
    cpu_only: bool,
    passthrough: &[String],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        workspace.dir().into(),
        "-o".into(),
        output.into(),
    ];
    if cpu_only && !passthrough.iter().any(|opt| opt == CPU_FLAG) {
        args.push(CPU_FLAG.into());
    }
    args.extend(passthrough.iter().map(OsString::from));
    args
}
