//! # Host CLI
//!
//! 无界面的宿主层：在终端里驱动 scene-runtime。
//!
//! ## 用法
//!
//! ```bash
//! # 模拟结局演出（音频命令写进日志）
//! cargo run -p host-cli -- ending
//! cargo run -p host-cli -- --assets assets --dt 0.033 ending --line-interval 0.5
//!
//! # 模拟 NPC 漫游
//! cargo run -p host-cli -- wander --seconds 60 --seed 7
//! cargo run -p host-cli -- -v wander --area area.json --start 1,1
//! ```

mod assets;
mod output;
mod sim;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scene_runtime::{GameConfig, Polygon, Vec2};
use tracing::info;
use tracing::level_filters::LevelFilter;

use crate::assets::FsAssetStore;
use crate::sim::{EndingOptions, default_area, run_ending, run_wander};

#[derive(Parser)]
#[command(name = "host-cli")]
#[command(about = "场景逻辑的无界面宿主 - 结局演出与 NPC 漫游模拟")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：config.json，不存在时使用默认配置）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 资源根目录（默认：assets）
    #[arg(short, long, default_value = "assets", global = true)]
    assets: PathBuf,

    /// 固定帧间隔（秒）
    #[arg(long, default_value_t = 1.0 / 60.0, global = true)]
    dt: f32,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 模拟结局演出
    Ending {
        /// 每个对话节点的行数
        #[arg(long, default_value_t = 3)]
        lines: usize,

        /// 对话推进一行的间隔（秒）
        #[arg(long, default_value_t = 1.0)]
        line_interval: f32,

        /// 最长模拟时间（秒），超时视为演出卡死
        #[arg(long, default_value_t = 600.0)]
        max_seconds: f32,
    },

    /// 模拟 NPC 漫游
    Wander {
        /// 模拟时长（秒）
        #[arg(long, default_value_t = 30.0)]
        seconds: f32,

        /// 随机种子（不指定时每次不同）
        #[arg(long)]
        seed: Option<u64>,

        /// 漫游区域 JSON 文件（`{"vertices":[{"x":0,"y":0},...]}`），默认 L 形区域
        #[arg(long)]
        area: Option<PathBuf>,

        /// 起点 `x,y`
        #[arg(long, default_value = "1,1", value_parser = parse_point)]
        start: Vec2,
    },
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("坐标格式应为 x,y: {s}"))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("x 无效: {e}"))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("y 无效: {e}"))?;
    Ok(Vec2::new(x, y))
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}

fn load_area(path: Option<&PathBuf>) -> Result<Polygon> {
    let Some(path) = path else {
        return Ok(default_area());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取漫游区域文件: {}", path.display()))?;
    let area: Polygon = serde_json::from_str(&content)
        .with_context(|| format!("漫游区域文件格式错误: {}", path.display()))?;
    anyhow::ensure!(area.is_valid(), "漫游区域至少需要 3 个顶点");
    Ok(area)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = GameConfig::load(&cli.config);
    config.validate().context("配置校验失败")?;

    match cli.command {
        Commands::Ending {
            lines,
            line_interval,
            max_seconds,
        } => {
            let store = FsAssetStore::new(&cli.assets);
            info!(assets = %store.base_path().display(), dt = cli.dt, "开始模拟结局演出");
            let report = run_ending(
                &config,
                store,
                &EndingOptions {
                    dt: cli.dt,
                    lines_per_node: lines,
                    line_interval,
                    max_seconds,
                },
            )?;
            info!(
                ticks = report.ticks,
                seconds = report.elapsed,
                screen = report.screen.as_deref().unwrap_or("-"),
                audio_commands = report.audio_commands,
                "结局演出结束"
            );
        }
        Commands::Wander {
            seconds,
            seed,
            area,
            start,
        } => {
            let area = load_area(area.as_ref())?;
            let report = run_wander(&config.wander, area, start, seconds, cli.dt, seed)?;
            info!(
                x = report.position.x,
                y = report.position.y,
                targets = report.targets,
                waits = report.waits,
                left_area = report.left_area,
                "漫游模拟结束"
            );
        }
    }

    Ok(())
}
