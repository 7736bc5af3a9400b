//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 scene-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `asset-check`: 检查配置文件和它引用的音频/图片资源

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use scene_runtime::GameConfig;
use walkdir::WalkDir;

/// 音频扩展名（与 host-cli 的探测顺序一致）
const AUDIO_EXTENSIONS: &[&str] = &["ogg", "wav", "mp3"];

/// 图片扩展名
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// 门禁检查的 cargo 子命令，按顺序执行
const GATE_STEPS: &[&[&str]] = &[
    &["fmt", "--all", "--", "--check"],
    &["clippy", "--workspace", "--all-targets"],
    &["test", "--workspace"],
];

/// 覆盖率统计不包含的 crate（只有命令行胶水）
const COVERAGE_EXCLUDED: &[&str] = &["xtask"];

/// `cargo llvm-cov` 参数：`package` 为 `None` 时统计整个 workspace
fn coverage_args(package: Option<&str>) -> Vec<String> {
    let mut args = vec!["llvm-cov".to_string()];
    match package {
        Some(package) => args.extend(["-p".to_string(), package.to_string()]),
        None => {
            args.push("--workspace".to_string());
            for excluded in COVERAGE_EXCLUDED {
                args.extend(["--exclude".to_string(), excluded.to_string()]);
            }
        }
    }
    args.extend(["--all-features".to_string(), "--html".to_string()]);
    args
}

/// 执行 cargo，步骤名就是完整命令行
fn cargo<S: AsRef<str>>(args: &[S]) -> anyhow::Result<()> {
    let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
    let mut cmd = Command::new("cargo");
    cmd.args(&args);
    run(&format!("cargo {}", args.join(" ")), &mut cmd)
}

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    let status = cmd.status();
    match status {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            // 任何一步失败都立即停止
            for &step in GATE_STEPS {
                cargo(step)?;
            }
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;
            cargo(coverage_args(Some("scene-runtime")).as_slice())?;
            eprintln!("\n覆盖率报告: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;
            cargo(coverage_args(None).as_slice())?;
            eprintln!("\n覆盖率报告: target/llvm-cov/html/index.html");
        }
        "asset-check" => {
            let config = args.next().map(PathBuf::from);
            let assets = args.next().map(PathBuf::from);
            asset_check(config, assets)?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 scene-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  asset-check     检查配置与资源

ASSET-CHECK:
  cargo xtask asset-check [config.json] [assets]

  检查内容：
    - 配置文件能否解析、取值是否有效（不存在时检查默认配置）
    - 配置引用的音效/BGM 是否存在
    - 解说图片目录是否有图片

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-runtime   -> cargo xtask cov-runtime
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo asset-check   -> cargo xtask asset-check
"#
    );
}

//=============================================================================
// asset-check 命令实现
//=============================================================================

/// 缺失的资源信息
struct MissingResource {
    kind: &'static str,
    path: String,
}

/// 执行资源检查
fn asset_check(config_path: Option<PathBuf>, assets_root: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));
    let assets_root = assets_root.unwrap_or_else(|| PathBuf::from("assets"));

    // 与运行时不同：配置文件存在但无法解析时直接报错
    let config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_json::from_str::<GameConfig>(&content)
            .map_err(|e| anyhow::anyhow!("{}: {e}", config_path.display()))?
    } else {
        eprintln!("[WARN] 配置文件不存在，检查默认配置: {}", config_path.display());
        GameConfig::default()
    };
    config.validate()?;

    if !assets_root.is_dir() {
        anyhow::bail!(
            "资源目录不存在: {}\n请在 workspace 根目录运行，或指定资源目录",
            assets_root.display()
        );
    }

    eprintln!("==> 检查资源目录 {}...\n", assets_root.display());

    let sound = &config.sound;
    let mut missing = Vec::new();
    let effects = [
        &sound.decision_sound,
        &sound.cancel_sound,
        &sound.dialogue_forward_sound,
        &sound.footstep_sound,
    ];
    for name in effects {
        let path = format!("{}/SE/{}", sound.sound_root, name);
        if !audio_exists(&assets_root, &path) {
            missing.push(MissingResource { kind: "SE", path });
        }
    }
    for name in [&sound.main_theme, &config.ending.ending_music] {
        let path = format!("{}/BGM/{}", sound.sound_root, name);
        if !audio_exists(&assets_root, &path) {
            missing.push(MissingResource { kind: "BGM", path });
        }
    }

    let images = collect_images(&assets_root.join(&config.ending.description_dir));

    eprintln!("─────────────────────────────────────────────────────");
    for mr in &missing {
        eprintln!("[WARN] 资源不存在 [{}] {}", mr.kind, mr.path);
    }
    eprintln!("解说图片: {} 张", images.len());

    eprintln!();
    if images.is_empty() {
        eprintln!(
            "❌ 解说图片目录为空: {}",
            config.ending.description_dir
        );
        anyhow::bail!("资源检查发现错误");
    } else if !missing.is_empty() {
        eprintln!("⚠️  0 个错误, {} 个警告", missing.len());
    } else {
        eprintln!("✅ 检查通过，无错误");
    }

    Ok(())
}

/// 逻辑路径（可省略扩展名）对应的音频是否存在
fn audio_exists(root: &Path, logical: &str) -> bool {
    let direct = root.join(logical);
    direct.is_file()
        || AUDIO_EXTENSIONS
            .iter()
            .any(|ext| root.join(format!("{logical}.{ext}")).is_file())
}

/// 收集目录下的所有图片（递归）
fn collect_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        })
        .collect();
    images.sort();
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_gate_runs_fmt_before_clippy_before_test() {
        let commands: Vec<&str> = GATE_STEPS.iter().map(|step| step[0]).collect();
        assert_eq!(commands, ["fmt", "clippy", "test"]);
    }

    #[test]
    fn test_coverage_args() {
        assert_eq!(
            coverage_args(Some("scene-runtime")).join(" "),
            "llvm-cov -p scene-runtime --all-features --html"
        );
        assert_eq!(
            coverage_args(None).join(" "),
            "llvm-cov --workspace --exclude xtask --all-features --html"
        );
    }

    #[test]
    fn test_audio_exists_tries_extensions() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Sounds/SE")).unwrap();
        fs::write(dir.path().join("Sounds/SE/Decision.wav"), b"x").unwrap();

        assert!(audio_exists(dir.path(), "Sounds/SE/Decision"));
        assert!(audio_exists(dir.path(), "Sounds/SE/Decision.wav"));
        assert!(!audio_exists(dir.path(), "Sounds/SE/Cancel"));
    }

    #[test]
    fn test_collect_images_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/Description02.PNG"), b"x").unwrap();
        fs::write(dir.path().join("Description01.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let images = collect_images(dir.path());
        assert_eq!(
            images,
            vec![
                dir.path().join("Description01.jpg"),
                dir.path().join("b/Description02.PNG"),
            ]
        );
    }
}
