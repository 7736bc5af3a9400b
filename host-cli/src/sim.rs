//! # Sim 模块
//!
//! 无界面的模拟运行：脚本化的对话系统 + 日志形式的宿主层对象。

use std::collections::HashSet;

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use scene_runtime::ending::DESCRIPTION_NODE;
use scene_runtime::{
    CameraRig, DescriptionAtlas, DialogueEvent, DialogueRunner, EndingContext, EndingSequence, EndingStage,
    GameConfig, HudControls, PlayerControl, Polygon, ScreenLoader, SoundManager, Vec2,
    WanderBehavior, WanderConfig, WanderState,
};
use tracing::{debug, info, warn};

use crate::assets::FsAssetStore;
use crate::output::LoggingAudioOutput;

/// 脚本化对话系统
///
/// 每个节点固定行数，每隔 `line_interval` 秒推进一行；
/// 解说节点每推进一行，进度变量加一。
#[derive(Debug)]
pub struct ScriptedDialogue {
    lines_per_node: usize,
    line_interval: f32,
    progress_variable: String,
    active: bool,
    current: Option<String>,
    remaining_lines: usize,
    timer: f32,
    visited: HashSet<String>,
    progress: Option<f32>,
    events: Vec<DialogueEvent>,
}

impl ScriptedDialogue {
    pub fn new(lines_per_node: usize, line_interval: f32, progress_variable: impl Into<String>) -> Self {
        Self {
            lines_per_node,
            line_interval,
            progress_variable: progress_variable.into(),
            active: true,
            current: None,
            remaining_lines: 0,
            timer: 0.0,
            visited: HashSet::new(),
            progress: None,
            events: Vec::new(),
        }
    }

    /// 推进 `dt` 秒
    pub fn update(&mut self, dt: f32) {
        if !self.active || self.current.is_none() {
            return;
        }

        self.timer += dt;
        while self.timer >= self.line_interval {
            self.timer -= self.line_interval;
            if !self.next_line() {
                break;
            }
        }
    }

    /// 推进一行，节点结束时返回 `false`
    fn next_line(&mut self) -> bool {
        let Some(node) = self.current.as_ref() else {
            return false;
        };

        if self.remaining_lines == 0 {
            info!(node = %node, "对话节点结束");
            self.visited.insert(node.clone());
            self.current = None;
            return false;
        }

        self.remaining_lines -= 1;
        if node == DESCRIPTION_NODE {
            let progress = self.progress.unwrap_or(0.0) + 1.0;
            debug!(progress = progress, "解说进度");
            self.progress = Some(progress);
        }
        true
    }
}

impl DialogueRunner for ScriptedDialogue {
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn stop(&mut self) {
        self.current = None;
    }

    fn start_dialogue(&mut self, node: &str) {
        info!(node = %node, "开始对话");
        self.current = Some(node.to_string());
        self.remaining_lines = self.lines_per_node;
        self.timer = 0.0;
        self.events.push(DialogueEvent::Started {
            node: node.to_string(),
        });
        if node == DESCRIPTION_NODE {
            self.progress = Some(0.0);
        }
    }

    fn has_visited_node(&self, node: &str) -> bool {
        self.visited.contains(node)
    }

    fn number_variable(&self, name: &str) -> Option<f32> {
        if name == self.progress_variable {
            self.progress
        } else {
            None
        }
    }

    fn take_events(&mut self) -> Vec<DialogueEvent> {
        std::mem::take(&mut self.events)
    }
}

/// 只写日志的玩家、HUD、场景切换
#[derive(Debug, Default)]
pub struct LoggingHost {
    /// 最后一次切换到的场景
    pub loaded_screen: Option<String>,
}

impl PlayerControl for LoggingHost {
    fn set_can_move(&mut self, can_move: bool) {
        info!(can_move = can_move, "玩家输入");
    }
}

impl HudControls for LoggingHost {
    fn set_log_view_available(&mut self, available: bool) {
        info!(available = available, "对话记录界面");
    }

    fn set_clue_view_available(&mut self, available: bool) {
        info!(available = available, "线索界面");
    }

    fn set_start_dialogue_button_available(&mut self, available: bool) {
        info!(available = available, "开始对话按钮");
    }
}

impl ScreenLoader for LoggingHost {
    fn load_screen(&mut self, name: &str) {
        info!(screen = %name, "加载场景");
        self.loaded_screen = Some(name.to_string());
    }
}

/// 结局模拟参数
#[derive(Debug, Clone)]
pub struct EndingOptions {
    pub dt: f32,
    pub lines_per_node: usize,
    pub line_interval: f32,
    pub max_seconds: f32,
}

/// 结局模拟结果
#[derive(Debug, Clone)]
pub struct EndingReport {
    pub ticks: usize,
    pub elapsed: f32,
    pub screen: Option<String>,
    pub audio_commands: usize,
}

/// 模拟一次结局演出
///
/// 先播放主题 BGM 代表正常游戏状态，然后立即触发结局。
pub fn run_ending(config: &GameConfig, store: FsAssetStore, options: &EndingOptions) -> Result<EndingReport> {
    if options.dt <= 0.0 {
        bail!("dt 必须为正数: {}", options.dt);
    }

    let atlas = DescriptionAtlas::load(&store, &config.ending.description_dir);
    if atlas.is_empty() {
        warn!(dir = %config.ending.description_dir, "没有解说图片");
    }

    let mut stage = EndingStage::new(atlas);
    let mut cameras = CameraRig::default();
    let mut host = LoggingHost::default();
    let mut player = LoggingHost::default();
    let mut hud = LoggingHost::default();
    let mut dialogue = ScriptedDialogue::new(
        options.lines_per_node,
        options.line_interval,
        &config.ending.progress_variable,
    );
    let mut sound = SoundManager::new(store, LoggingAudioOutput::new(), config.sound.clone());
    let mut sequence = EndingSequence::new(config.ending.clone());

    sound.play_main_theme(0.0);

    let mut ticks = 0usize;
    let mut elapsed = 0.0f32;
    let mut last_phase = None;
    while !sequence.is_completed() {
        if elapsed > options.max_seconds {
            bail!("结局演出在 {} 秒内没有结束（当前阶段 {:?}）", options.max_seconds, sequence.phase());
        }

        dialogue.update(options.dt);
        {
            let mut ctx = EndingContext {
                player: &mut player,
                dialogue: &mut dialogue,
                hud: &mut hud,
                screens: &mut host,
                sound: &mut sound,
                cameras: &mut cameras,
                stage: &mut stage,
            };
            sequence.update(true, options.dt, &mut ctx);
        }
        for event in dialogue.take_events() {
            sound.handle_dialogue_event(&event);
        }
        sound.update(options.dt);

        if sequence.phase() != last_phase {
            if let Some(phase) = sequence.phase() {
                info!(
                    phase = ?phase,
                    t = elapsed,
                    camera = %cameras.active().name,
                    image = stage.description.image().map(|i| i.name()).unwrap_or("-"),
                    "阶段"
                );
            }
            last_phase = sequence.phase();
        }

        ticks += 1;
        elapsed += options.dt;
    }

    let cache = sound.music_cache().stats();
    debug!(stats = %cache.format(), "BGM 缓存");

    Ok(EndingReport {
        ticks,
        elapsed,
        screen: host.loaded_screen,
        audio_commands: sound.output().submitted(),
    })
}

/// 默认漫游区域：L 形
pub fn default_area() -> Polygon {
    Polygon::new(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 3.0),
        Vec2::new(3.0, 3.0),
        Vec2::new(3.0, 10.0),
        Vec2::new(0.0, 10.0),
    ])
}

/// 漫游模拟结果
#[derive(Debug, Clone)]
pub struct WanderReport {
    pub position: Vec2,
    pub targets: usize,
    pub waits: usize,
    pub left_area: bool,
}

/// 模拟 NPC 漫游 `seconds` 秒
///
/// 位置按 `position += velocity * dt` 积分。
pub fn run_wander(
    config: &WanderConfig,
    area: Polygon,
    start: Vec2,
    seconds: f32,
    dt: f32,
    seed: Option<u64>,
) -> Result<WanderReport> {
    if dt <= 0.0 {
        bail!("dt 必须为正数: {dt}");
    }
    if !area.contains(start) {
        bail!("起点 ({}, {}) 不在漫游区域内", start.x, start.y);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut behavior = WanderBehavior::new(config.clone(), area.clone(), start, &mut rng);
    let mut position = start;
    let mut last_state = behavior.state();
    let mut report = WanderReport {
        position,
        targets: usize::from(matches!(last_state, WanderState::Moving { .. })),
        waits: 0,
        left_area: false,
    };

    let mut elapsed = 0.0f32;
    while elapsed < seconds {
        let output = behavior.update(position, dt, &mut rng);
        position = position + output.velocity * dt;
        elapsed += dt;

        let state = behavior.state();
        match (last_state, state) {
            (_, WanderState::Moving { target }) if last_state != state => {
                report.targets += 1;
                info!(x = target.x, y = target.y, t = elapsed, "新目标点");
            }
            (WanderState::Moving { .. }, WanderState::Waiting { remaining }) => {
                report.waits += 1;
                info!(remaining = remaining, t = elapsed, "停下等待");
            }
            _ => {}
        }
        last_state = state;

        if !report.left_area && !area.contains(position) {
            warn!(x = position.x, y = position.y, "位置离开了漫游区域");
            report.left_area = true;
        }
    }

    report.position = position;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> EndingOptions {
        EndingOptions {
            dt: 1.0 / 30.0,
            lines_per_node: 3,
            line_interval: 0.5,
            max_seconds: 120.0,
        }
    }

    #[test]
    fn test_scripted_dialogue_finishes_node() {
        let mut dialogue = ScriptedDialogue::new(2, 1.0, "$DescriptionProgress");
        dialogue.start_dialogue(DESCRIPTION_NODE);
        assert_eq!(dialogue.number_variable("$DescriptionProgress"), Some(0.0));

        dialogue.update(1.0);
        dialogue.update(1.0);
        assert_eq!(dialogue.number_variable("$DescriptionProgress"), Some(2.0));
        assert!(!dialogue.has_visited_node(DESCRIPTION_NODE));

        dialogue.update(1.0);
        assert!(dialogue.has_visited_node(DESCRIPTION_NODE));
        assert_eq!(dialogue.number_variable("Other"), None);
    }

    #[test]
    fn test_start_dialogue_emits_started_once() {
        let mut dialogue = ScriptedDialogue::new(1, 1.0, "$DescriptionProgress");
        dialogue.start_dialogue("Ending");
        assert_eq!(
            dialogue.take_events(),
            vec![DialogueEvent::Started {
                node: "Ending".to_string()
            }]
        );
        assert!(dialogue.take_events().is_empty());
    }

    #[test]
    fn test_inactive_dialogue_does_not_advance() {
        let mut dialogue = ScriptedDialogue::new(0, 0.1, "$DescriptionProgress");
        dialogue.start_dialogue("Ending");
        dialogue.set_active(false);
        dialogue.update(1.0);
        assert!(!dialogue.has_visited_node("Ending"));
    }

    #[test]
    fn test_run_ending_with_empty_assets() {
        let dir = TempDir::new().unwrap();
        let report = run_ending(
            &GameConfig::default(),
            FsAssetStore::new(dir.path()),
            &options(),
        )
        .unwrap();

        assert_eq!(report.screen.as_deref(), Some("ScenarioSelect"));
        assert!(report.elapsed < 120.0);
    }

    #[test]
    fn test_run_ending_plays_music() {
        let dir = TempDir::new().unwrap();
        for file in ["Sounds/BGM/MainTheme.ogg", "Sounds/BGM/Ending.ogg"] {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"ogg").unwrap();
        }

        let report = run_ending(
            &GameConfig::default(),
            FsAssetStore::new(dir.path()),
            &options(),
        )
        .unwrap();
        assert_eq!(report.screen.as_deref(), Some("ScenarioSelect"));
        assert!(report.audio_commands > 0);
    }

    #[test]
    fn test_run_ending_rejects_bad_dt() {
        let dir = TempDir::new().unwrap();
        let mut opts = options();
        opts.dt = 0.0;
        assert!(run_ending(&GameConfig::default(), FsAssetStore::new(dir.path()), &opts).is_err());
    }

    #[test]
    fn test_run_wander_stays_inside() {
        let report = run_wander(
            &WanderConfig::default(),
            default_area(),
            Vec2::new(1.0, 1.0),
            30.0,
            1.0 / 60.0,
            Some(42),
        )
        .unwrap();
        assert!(report.targets > 0);
        assert!(!report.left_area);
    }

    #[test]
    fn test_run_wander_rejects_outside_start() {
        let result = run_wander(
            &WanderConfig::default(),
            default_area(),
            Vec2::new(8.0, 8.0),
            1.0,
            1.0 / 60.0,
            Some(1),
        );
        assert!(result.is_err());
    }
}
