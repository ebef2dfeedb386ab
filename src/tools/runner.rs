use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// 診断用に残す出力の最大行数。
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// 外部コマンドの実行結果。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// 終了コード。シグナルで終了した場合は `None`。
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// 出力なしで終了コード0の結果。
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// エラー表示用の出力末尾。stderr が空なら stdout を使います。
    pub fn diagnostics(&self) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.trim_end().lines().collect();
        let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
        lines[start..].join("\n")
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "終了コード {}", code)?,
            None => write!(f, "シグナルにより終了")?,
        }
        let tail = self.diagnostics();
        if !tail.is_empty() {
            write!(f, "\n--- ツールの出力 ---\n{}", tail)?;
        }
        Ok(())
    }
}

/// 外部コマンドを同期的に実行する能力。
///
/// テストでは偽の実装に差し替えて、実際のツールを起動せずに各ステージを検証します。
pub trait CommandRunner {
    /// 実行可能ファイルの場所を解決します。見つからなければ `None`。
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// コマンドを実行し、完了まで待って出力を取り込みます。
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<CommandOutput>;
}

/// `std::process::Command` を使う実装。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        let candidate = Path::new(program);
        // 区切り文字を含む場合は PATH を使わずそのパスを検証する
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .flat_map(|dir| executable_names(program).map(move |name| dir.join(name)))
            .find(|path| is_executable(path))
    }

    fn run(&self, program: &str, args: &[OsString]) -> io::Result<CommandOutput> {
        debug!(command = %render_command(program, args), "外部コマンドを実行します");
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // 出力は行ごとに debug ログへ流しつつ取り込む
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout, stderr) = thread::scope(|s| {
            let out = s.spawn(|| forward_lines(stdout, "stdout"));
            let err = forward_lines(stderr, "stderr");
            (out.join().unwrap_or_default(), err)
        });
        let status = child.wait()?;

        let result = CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        };
        debug!(code = ?result.code, "外部コマンドが終了しました");
        Ok(result)
    }
}

/// パイプを1行ずつ読み、ログに流しつつ全体を文字列として返します。
fn forward_lines<R: Read>(pipe: Option<R>, stream: &'static str) -> String {
    let Some(pipe) = pipe else {
        return String::new();
    };
    let mut reader = BufReader::new(pipe);
    let mut captured = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                debug!(stream, "{}", text.trim_end());
                captured.push_str(&text);
            }
        }
    }
    captured
}

/// ログ表示用にコマンドラインを1行に整形します。
pub fn render_command(program: &str, args: &[OsString]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(windows)]
fn executable_names(program: &str) -> impl Iterator<Item = OsString> {
    let exts = env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.BAT;.CMD".to_string());
    let mut names = vec![OsString::from(program)];
    names.extend(exts.split(';').map(|ext| OsString::from(format!("{}{}", program, ext))));
    names.into_iter()
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> impl Iterator<Item = OsString> {
    std::iter::once(OsString::from(program))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
